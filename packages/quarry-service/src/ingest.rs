//! Batch ingestion of uploaded documents.
//!
//! One call drains the upload directory. Each file moves to the ingested
//! directory up front, then runs through the pipeline; all surviving chunks
//! land in the vector store and the record log with one bulk insert at the
//! end. Per-file failures are reported, never fatal.

use std::path::Path;

use serde::Serialize;
use time::OffsetDateTime;

use quarry_storage::{models::ChunkRecord, records};

use crate::{QuarryService, ServiceResult};

#[derive(Clone, Debug, Serialize)]
pub struct IngestFailure {
	pub file: String,
	pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct IngestResponse {
	pub success: bool,
	pub message: String,
	pub processed_files: Vec<String>,
	pub failed_files: Vec<IngestFailure>,
	pub total_chunks: usize,
}

impl QuarryService {
	pub async fn ingest(&self) -> ServiceResult<IngestResponse> {
		let upload_dir = self.cfg.storage.data.upload_dir();
		let ingested_dir = self.cfg.storage.data.ingested_dir();

		tokio::fs::create_dir_all(&upload_dir).await?;
		tokio::fs::create_dir_all(&ingested_dir).await?;

		let files = list_sorted(&upload_dir).await?;

		if files.is_empty() {
			return Ok(IngestResponse {
				success: true,
				message: "No files to process.".into(),
				processed_files: Vec::new(),
				failed_files: Vec::new(),
				total_chunks: 0,
			});
		}

		let dictionary = self.tag_store.load_or_init().await?;
		let mut processed = Vec::new();
		let mut failed = Vec::new();
		let mut all_chunks = Vec::new();

		for file_name in files {
			// The move happens before processing; a failed file stays in
			// the ingested directory.
			let path = ingested_dir.join(&file_name);

			if let Err(err) = tokio::fs::rename(upload_dir.join(&file_name), &path).await {
				failed.push(IngestFailure {
					file: file_name,
					reason: format!("failed to move into ingested directory: {err}"),
				});

				continue;
			}

			let extension = extension_of(&file_name);
			let Some(extractor) = self.extractors.get(&extension) else {
				failed.push(IngestFailure {
					file: file_name,
					reason: format!("no processor registered for \"{extension}\""),
				});

				continue;
			};
			let chunks =
				self.process_document(extractor.as_ref(), &path, &dictionary).await;

			if chunks.is_empty() {
				failed.push(IngestFailure {
					file: file_name,
					reason: "processing produced no chunks".into(),
				});

				continue;
			}

			all_chunks.extend(chunks);
			processed.push(file_name);
		}

		let total_chunks = all_chunks.len();

		if !all_chunks.is_empty()
			&& let Err(err) = self.persist_batch(&all_chunks).await
		{
			failed.push(IngestFailure {
				file: "(batch)".into(),
				reason: format!("vector insert failed: {err}"),
			});
		}

		tracing::info!(
			processed = processed.len(),
			failed = failed.len(),
			total_chunks,
			"Ingestion batch finished.",
		);

		Ok(IngestResponse {
			success: failed.is_empty(),
			message: format!(
				"Processed {} files into {total_chunks} chunks. {} failures.",
				processed.len(),
				failed.len()
			),
			processed_files: processed,
			failed_files: failed,
			total_chunks,
		})
	}

	async fn persist_batch(&self, chunks: &[ChunkRecord]) -> ServiceResult<()> {
		self.vectors.ensure_collection().await?;
		self.vectors.insert_chunks(chunks).await?;
		records::append_chunks(
			&self.cfg.storage.data.records_file(),
			chunks,
			OffsetDateTime::now_utc(),
		)
		.await?;

		Ok(())
	}
}

/// Regular files in the directory, sorted by name so batches are
/// deterministic.
async fn list_sorted(dir: &Path) -> std::io::Result<Vec<String>> {
	let mut entries = tokio::fs::read_dir(dir).await?;
	let mut files = Vec::new();

	while let Some(entry) = entries.next_entry().await? {
		if entry.file_type().await?.is_file() {
			files.push(entry.file_name().to_string_lossy().into_owned());
		}
	}

	files.sort();

	Ok(files)
}

fn extension_of(file_name: &str) -> String {
	file_name.rfind('.').map(|dot| file_name[dot..].to_lowercase()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extension_includes_leading_dot_and_lowers() {
		assert_eq!(extension_of("Report.DOCX"), ".docx");
		assert_eq!(extension_of("notes.md"), ".md");
		assert_eq!(extension_of("no-extension"), "");
	}
}
