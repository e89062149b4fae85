use std::path::Path;

use crate::{BoxFuture, DocumentExtractor, Extraction};

/// Deterministic placeholder for formats without an implemented extractor.
/// Returns empty output and logs, so the pipeline records the document as a
/// processing failure rather than crashing or silently succeeding.
pub struct StubExtractor {
	format: String,
}
impl StubExtractor {
	pub fn new(format: &str) -> Self {
		Self { format: format.to_string() }
	}
}

impl DocumentExtractor for StubExtractor {
	fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Extraction> {
		Box::pin(async move {
			tracing::warn!(
				format = %self.format,
				path = %path.display(),
				"Extraction for this format is not implemented.",
			);

			Extraction::default()
		})
	}
}
