use serde_json::Value;
use uuid::Uuid;

/// One retrievable chunk of an ingested document. Immutable once created;
/// corrections happen by re-ingesting the document.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ChunkRecord {
	pub chunk_id: Uuid,
	pub content: String,
	pub source: String,
	pub original_file: String,
	pub chunk_index: u32,
	pub total_chunks: u32,
	pub tags: Vec<String>,
	pub embedding: Vec<f32>,
	pub metadata: Value,
}
