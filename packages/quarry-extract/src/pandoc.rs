use std::{
	io,
	path::{Path, PathBuf},
};

use tokio::process::Command;

use crate::{BoxFuture, DocumentExtractor, Extraction, ImageFile};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Conversion-based extractor. Invokes the external pandoc binary to turn
/// the document into markdown, with embedded media extracted into a
/// temporary directory as a side channel.
pub struct PandocExtractor {
	pandoc_bin: String,
}
impl PandocExtractor {
	pub fn new(pandoc_bin: &str) -> Self {
		Self { pandoc_bin: pandoc_bin.to_string() }
	}

	async fn convert(&self, path: &Path) -> io::Result<Extraction> {
		let temp_dir = tempfile::tempdir()?;
		let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("document");
		let markdown_file = temp_dir.path().join(format!("{stem}.md"));
		let media_dir = temp_dir.path().join("media");

		tokio::fs::create_dir_all(&media_dir).await?;

		let output = Command::new(&self.pandoc_bin)
			.arg(path)
			.arg("--to=markdown")
			.arg("--output")
			.arg(&markdown_file)
			.arg("--extract-media")
			.arg(&media_dir)
			.arg("--wrap=none")
			.output()
			.await?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);

			return Err(io::Error::other(format!("pandoc exited with failure: {stderr}")));
		}

		let text = tokio::fs::read_to_string(&markdown_file).await.unwrap_or_else(|err| {
			tracing::error!(error = %err, "Pandoc produced no readable markdown output.");

			String::new()
		});
		let images = collect_images(&media_dir).await;

		Ok(Extraction { text, images })
	}
}

impl DocumentExtractor for PandocExtractor {
	fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Extraction> {
		Box::pin(async move {
			match self.convert(path).await {
				Ok(extraction) => extraction,
				Err(err) => {
					tracing::error!(
						error = %err,
						path = %path.display(),
						"Pandoc extraction failed.",
					);

					Extraction::default()
				},
			}
		})
	}
}

/// Walks the media directory pandoc wrote into and reads every image file.
/// Unreadable entries are skipped with a log line; a bad image never aborts
/// the extraction.
async fn collect_images(media_dir: &Path) -> Vec<ImageFile> {
	let mut images = Vec::new();
	let mut pending: Vec<PathBuf> = vec![media_dir.to_path_buf()];

	while let Some(dir) = pending.pop() {
		let mut entries = match tokio::fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(err) => {
				tracing::warn!(error = %err, dir = %dir.display(), "Media directory is unreadable.");

				continue;
			},
		};

		while let Ok(Some(entry)) = entries.next_entry().await {
			let path = entry.path();

			if path.is_dir() {
				pending.push(path);

				continue;
			}
			if !is_image(&path) {
				continue;
			}

			let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
				continue;
			};

			match tokio::fs::read(&path).await {
				Ok(data) => images.push(ImageFile { name: name.to_string(), data }),
				Err(err) => {
					tracing::warn!(error = %err, image = %name, "Extracted image is unreadable.");
				},
			}
		}
	}

	images.sort_by(|a, b| a.name.cmp(&b.name));

	images
}

fn is_image(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
		.unwrap_or(false)
}
