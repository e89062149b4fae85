//! Ingested document lookup.
//!
//! Uploaded files are stored as `{file_id}_{original_name}` so the id
//! survives the move into the ingested directory. Lookup is a prefix scan
//! of that directory.

use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{QuarryService, ServiceResult};

#[derive(Clone, Debug, Serialize)]
pub struct DocumentMetadata {
	pub file_id: String,
	pub filename: String,
	pub size: u64,
	pub modified: String,
}

impl QuarryService {
	pub async fn document_metadata(
		&self,
		file_id: &str,
	) -> ServiceResult<Option<DocumentMetadata>> {
		let prefix = format!("{file_id}_");
		let dir = self.cfg.storage.data.ingested_dir();
		let mut entries = match tokio::fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err.into()),
		};

		while let Some(entry) = entries.next_entry().await? {
			let name = entry.file_name().to_string_lossy().into_owned();

			if !name.starts_with(&prefix) {
				continue;
			}

			let meta = entry.metadata().await?;
			let modified = meta
				.modified()
				.ok()
				.map(OffsetDateTime::from)
				.and_then(|time| time.format(&Rfc3339).ok())
				.unwrap_or_default();

			return Ok(Some(DocumentMetadata {
				file_id: file_id.into(),
				filename: name,
				size: meta.len(),
				modified,
			}));
		}

		Ok(None)
	}
}
