//! Corpus statistics for the stats endpoint.

use std::path::Path;

use serde::Serialize;

use crate::{QuarryService, ServiceResult};

#[derive(Clone, Debug, Serialize)]
pub struct StatsResponse {
	pub total_chunks: u64,
	pub files_pending: u64,
	pub files_ingested: u64,
	pub supported_formats: Vec<String>,
}

impl QuarryService {
	pub async fn stats(&self) -> ServiceResult<StatsResponse> {
		self.vectors.ensure_collection().await?;

		let total_chunks = self.vectors.count().await?;
		let files_pending = count_files(&self.cfg.storage.data.upload_dir()).await?;
		let files_ingested = count_files(&self.cfg.storage.data.ingested_dir()).await?;

		Ok(StatsResponse {
			total_chunks,
			files_pending,
			files_ingested,
			supported_formats: self.cfg.ingest.allowed_extensions.clone(),
		})
	}
}

/// Counts regular files; a directory that does not exist yet counts zero.
async fn count_files(dir: &Path) -> std::io::Result<u64> {
	let mut entries = match tokio::fs::read_dir(dir).await {
		Ok(entries) => entries,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
		Err(err) => return Err(err),
	};
	let mut count = 0;

	while let Some(entry) = entries.next_entry().await? {
		if entry.file_type().await?.is_file() {
			count += 1;
		}
	}

	Ok(count)
}
