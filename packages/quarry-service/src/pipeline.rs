//! The document processing pipeline: extract, describe images, chunk,
//! tag, embed.
//!
//! Everything here is best-effort per document. A document that fails any
//! stage produces zero chunks and a log line; it never aborts the batch.

use std::path::Path;

use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use quarry_chunking::ChunkingConfig;
use quarry_extract::{DocumentExtractor, Extraction, ImageFile};
use quarry_storage::models::ChunkRecord;

use crate::QuarryService;

/// Shipped default used when no override file exists on disk yet. The file
/// is created on first use so operators can edit it in place.
pub const DEFAULT_VISION_PROMPT: &str = "Describe this image in detail. \
	Focus on the key information it conveys: text, diagrams, charts, tables, \
	and their relationships. Answer in plain prose.";

impl QuarryService {
	/// Runs one document through the full pipeline and returns its chunk
	/// records, embeddings included. Failures degrade to an empty batch.
	pub async fn process_document(
		&self,
		extractor: &dyn DocumentExtractor,
		path: &Path,
		dictionary: &[String],
	) -> Vec<ChunkRecord> {
		let original_file = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();
		let Extraction { text, images } = extractor.extract(path).await;
		let descriptions = self.describe_images(&images).await;
		let mut full_text = text;

		for description in &descriptions {
			full_text.push_str("\n\n");
			full_text.push_str(description);
		}

		if full_text.trim().is_empty() {
			tracing::warn!(file = %original_file, "Extraction produced no text.");

			return Vec::new();
		}
		if let Err(err) = self.save_separated(path, &full_text, &images).await {
			tracing::warn!(file = %original_file, error = %err, "Failed to save separated output.");
		}

		let chunking = ChunkingConfig {
			chunk_size: self.cfg.chunking.chunk_size,
			chunk_overlap: self.cfg.chunking.chunk_overlap,
			separators: self.cfg.chunking.separators.clone(),
		};
		let pieces = quarry_chunking::split_text(&full_text, &chunking);
		let total_chunks = pieces.len() as u32;
		let mut records = Vec::with_capacity(pieces.len());

		for (index, content) in pieces.into_iter().enumerate() {
			let (embedding, tags) = tokio::join!(
				self.providers.embedding.embed(&self.cfg.providers.embedding, &content),
				self.providers.tagging.select_tags(
					&self.cfg.providers.llm,
					&content,
					dictionary
				),
			);
			let embedding = match embedding {
				Ok(embedding) => embedding,
				Err(err) => {
					tracing::warn!(
						file = %original_file,
						chunk_index = index,
						error = %err,
						"Embedding failed; skipping chunk.",
					);

					continue;
				},
			};
			let timestamp = OffsetDateTime::now_utc()
				.format(&Rfc3339)
				.unwrap_or_default();

			records.push(ChunkRecord {
				chunk_id: Uuid::new_v4(),
				source: original_file.clone(),
				original_file: original_file.clone(),
				chunk_index: index as u32,
				total_chunks,
				tags,
				embedding,
				metadata: json!({
					"chunk_length": content.chars().count(),
					"processing_timestamp": timestamp,
				}),
				content,
			});
		}

		records
	}

	/// One description per image, positionally aligned with the input.
	/// Missing data or a provider failure yields a placeholder so the
	/// document text still notes the image existed.
	pub async fn describe_images(&self, images: &[ImageFile]) -> Vec<String> {
		let prompt = self.load_vision_prompt().await;
		let mut descriptions = Vec::with_capacity(images.len());

		for image in images {
			if image.data.is_empty() {
				descriptions.push(format!("[image {}]: no data extracted", image.name));

				continue;
			}

			match self
				.providers
				.vision
				.describe(&self.cfg.providers.vision, &prompt, &image.name, &image.data)
				.await
			{
				Ok(description) =>
					descriptions.push(format!("[image {}]: {description}", image.name)),
				Err(err) => {
					tracing::warn!(image = %image.name, error = %err, "Image description failed.");
					descriptions
						.push(format!("[image {}]: description unavailable", image.name));
				},
			}
		}

		descriptions
	}

	/// Loads the vision prompt from its override file, creating the file
	/// with the default text on first use.
	pub async fn load_vision_prompt(&self) -> String {
		let path = self.cfg.storage.data.vision_prompt_file();

		match tokio::fs::read_to_string(&path).await {
			Ok(prompt) => prompt,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				if let Some(parent) = path.parent()
					&& let Err(err) = tokio::fs::create_dir_all(parent).await
				{
					tracing::warn!(error = %err, "Failed to create prompt directory.");
				}
				if let Err(err) = tokio::fs::write(&path, DEFAULT_VISION_PROMPT).await {
					tracing::warn!(error = %err, "Failed to persist default vision prompt.");
				}

				DEFAULT_VISION_PROMPT.into()
			},
			Err(err) => {
				tracing::warn!(error = %err, "Failed to read vision prompt; using default.");

				DEFAULT_VISION_PROMPT.into()
			},
		}
	}

	/// Persists the post-extraction intermediate form: the combined text
	/// (captions appended) plus the raw images, under a per-document
	/// directory named after the source file stem.
	async fn save_separated(
		&self,
		source: &Path,
		full_text: &str,
		images: &[ImageFile],
	) -> std::io::Result<()> {
		let stem = source
			.file_stem()
			.map(|stem| stem.to_string_lossy().into_owned())
			.unwrap_or_else(|| "document".into());
		let dir = self.cfg.storage.data.separated_dir().join(stem);

		tokio::fs::create_dir_all(&dir).await?;
		tokio::fs::write(dir.join("content.md"), full_text).await?;

		if !images.is_empty() {
			let images_dir = dir.join("images");

			tokio::fs::create_dir_all(&images_dir).await?;

			for image in images {
				tokio::fs::write(images_dir.join(&image.name), &image.data).await?;
			}
		}

		Ok(())
	}
}
