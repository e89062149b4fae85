use std::path::Path;

use crate::{BoxFuture, DocumentExtractor, Extraction};

/// Direct read for plain text and markdown files.
pub struct TextExtractor;

impl DocumentExtractor for TextExtractor {
	fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Extraction> {
		Box::pin(async move {
			match tokio::fs::read_to_string(path).await {
				Ok(text) => Extraction { text, images: Vec::new() },
				Err(err) => {
					tracing::error!(error = %err, path = %path.display(), "Text extraction failed.");

					Extraction::default()
				},
			}
		})
	}
}
