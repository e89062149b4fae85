//! Document extractors.
//!
//! Each format implements [`DocumentExtractor`]: a conversion from a raw file
//! into plain text plus any embedded images. Extraction never fails hard:
//! an unreadable or unimplemented format logs and yields empty output, which
//! the pipeline reports as "zero chunks produced" for that document. New
//! formats are added by registering an implementation, not by editing a
//! dispatcher.

mod pandoc;
mod stub;
mod text;

pub use pandoc::PandocExtractor;
pub use stub::StubExtractor;
pub use text::TextExtractor;

use std::{collections::HashMap, future::Future, path::Path, pin::Pin, sync::Arc};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Clone, Debug)]
pub struct ImageFile {
	pub name: String,
	pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct Extraction {
	pub text: String,
	pub images: Vec<ImageFile>,
}

pub trait DocumentExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Extraction>;
}

#[derive(Clone)]
pub struct ExtractorRegistry {
	extractors: HashMap<String, Arc<dyn DocumentExtractor>>,
}
impl ExtractorRegistry {
	pub fn new() -> Self {
		Self { extractors: HashMap::new() }
	}

	/// The dispatch table the ingestion pipeline runs with: direct reads for
	/// plain text and markdown, pandoc conversion for docx, and explicit
	/// empty-output stubs for formats whose extraction is not implemented
	/// yet.
	pub fn standard(pandoc_bin: &str) -> Self {
		let mut registry = Self::new();
		let text = Arc::new(TextExtractor);
		let pandoc = Arc::new(PandocExtractor::new(pandoc_bin));

		registry.register(".txt", text.clone());
		registry.register(".md", text);
		registry.register(".docx", pandoc);

		for format in [".pdf", ".pptx", ".xlsx", ".html", ".htm"] {
			registry.register(format, Arc::new(StubExtractor::new(format)));
		}

		registry
	}

	pub fn register(&mut self, extension: &str, extractor: Arc<dyn DocumentExtractor>) {
		self.extractors.insert(extension.to_lowercase(), extractor);
	}

	pub fn get(&self, extension: &str) -> Option<Arc<dyn DocumentExtractor>> {
		self.extractors.get(&extension.to_lowercase()).cloned()
	}

	pub fn extensions(&self) -> Vec<String> {
		let mut extensions: Vec<String> = self.extractors.keys().cloned().collect();

		extensions.sort();

		extensions
	}
}
impl Default for ExtractorRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Media type for an image filename, inferred from its extension. Unknown
/// extensions fall back to jpeg.
pub fn media_type_for(name: &str) -> &'static str {
	let lowered = name.to_lowercase();

	if lowered.ends_with(".png") {
		"image/png"
	} else if lowered.ends_with(".gif") {
		"image/gif"
	} else if lowered.ends_with(".webp") {
		"image/webp"
	} else {
		"image/jpeg"
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn media_type_covers_known_extensions() {
		assert_eq!(media_type_for("figure.PNG"), "image/png");
		assert_eq!(media_type_for("photo.jpeg"), "image/jpeg");
		assert_eq!(media_type_for("photo.jpg"), "image/jpeg");
		assert_eq!(media_type_for("anim.gif"), "image/gif");
		assert_eq!(media_type_for("modern.webp"), "image/webp");
		assert_eq!(media_type_for("mystery.bin"), "image/jpeg");
	}

	#[test]
	fn registry_dispatches_case_insensitively() {
		let registry = ExtractorRegistry::standard("pandoc");

		assert!(registry.get(".TXT").is_some());
		assert!(registry.get(".docx").is_some());
		assert!(registry.get(".rtf").is_none());
	}

	#[tokio::test]
	async fn stub_extractor_returns_empty_output() {
		let stub = StubExtractor::new(".pdf");
		let extraction = stub.extract(Path::new("whatever.pdf")).await;

		assert!(extraction.text.is_empty());
		assert!(extraction.images.is_empty());
	}

	#[tokio::test]
	async fn text_extractor_reads_file_contents() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let path = dir.path().join("note.md");

		std::fs::write(&path, "# Heading\n\nBody text.").expect("Failed to write file.");

		let extraction = TextExtractor.extract(&path).await;

		assert_eq!(extraction.text, "# Heading\n\nBody text.");
		assert!(extraction.images.is_empty());
	}

	#[tokio::test]
	async fn text_extractor_tolerates_missing_file() {
		let extraction = TextExtractor.extract(Path::new("/nonexistent/void.txt")).await;

		assert!(extraction.text.is_empty());
	}
}
