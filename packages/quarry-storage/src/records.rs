use std::path::Path;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::io::AsyncWriteExt;

use crate::{Result, models::ChunkRecord};

/// Appends one JSON object per chunk to the record log. The log is
/// append-only audit state; embeddings stay out of it (they live in the
/// vector store) and each line carries the ingestion timestamp.
pub async fn append_chunks(
	path: &Path,
	chunks: &[ChunkRecord],
	ingested_at: OffsetDateTime,
) -> Result<()> {
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}

	let timestamp = ingested_at.format(&Rfc3339).map_err(|err| crate::Error::InvalidRecord {
		message: format!("Failed to format ingestion timestamp: {err}."),
	})?;
	let mut file =
		tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;

	for chunk in chunks {
		let line = serde_json::to_string(&serde_json::json!({
			"chunk_id": chunk.chunk_id,
			"content": chunk.content,
			"source": chunk.source,
			"original_file": chunk.original_file,
			"chunk_index": chunk.chunk_index,
			"total_chunks": chunk.total_chunks,
			"tags": chunk.tags,
			"metadata": chunk.metadata,
			"timestamp": timestamp,
		}))?;

		file.write_all(line.as_bytes()).await?;
		file.write_all(b"\n").await?;
	}

	file.flush().await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use uuid::Uuid;

	use super::*;

	fn chunk(index: u32) -> ChunkRecord {
		ChunkRecord {
			chunk_id: Uuid::new_v4(),
			content: format!("chunk {index}"),
			source: "doc.md".to_string(),
			original_file: "doc.md".to_string(),
			chunk_index: index,
			total_chunks: 2,
			tags: vec!["backend".to_string()],
			embedding: vec![0.0; 4],
			metadata: serde_json::json!({ "chunk_length": 7 }),
		}
	}

	#[tokio::test]
	async fn appends_one_line_per_chunk() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let path = dir.path().join("documents.jsonl");
		let now = OffsetDateTime::now_utc();

		append_chunks(&path, &[chunk(0), chunk(1)], now).await.expect("append failed");
		append_chunks(&path, &[chunk(0)], now).await.expect("append failed");

		let raw = tokio::fs::read_to_string(&path).await.expect("read failed");
		let lines: Vec<&str> = raw.lines().collect();

		assert_eq!(lines.len(), 3);

		for line in lines {
			let value: serde_json::Value = serde_json::from_str(line).expect("line is not JSON");

			assert!(value.get("timestamp").is_some());
			assert!(value.get("embedding").is_none());
		}
	}
}
