use std::collections::HashMap;

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, Query,
		QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value, VectorParamsBuilder,
		value::Kind,
	},
};

use crate::{Result, models::ChunkRecord};

/// A chunk as it comes back from the vector index: stored payload fields
/// plus the similarity score for the query vector.
#[derive(Clone, Debug)]
pub struct RetrievedChunk {
	pub chunk_id: String,
	pub content: String,
	pub source: String,
	pub original_file: String,
	pub chunk_index: i64,
	pub total_chunks: i64,
	pub tags: Vec<String>,
	pub metadata: serde_json::Value,
	pub similarity: f32,
}

pub struct VectorStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl VectorStore {
	pub fn new(cfg: &quarry_config::Vector) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(&self.collection).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		tracing::info!(collection = %self.collection, "Created vector collection.");

		Ok(())
	}

	/// One bulk insert per ingestion batch. Tags and metadata are stored as
	/// JSON-serialized strings in the payload.
	pub async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> Result<()> {
		let mut points = Vec::with_capacity(chunks.len());

		for chunk in chunks {
			let mut payload_map = HashMap::new();

			payload_map.insert("content".to_string(), Value::from(chunk.content.clone()));
			payload_map.insert("source".to_string(), Value::from(chunk.source.clone()));
			payload_map
				.insert("original_file".to_string(), Value::from(chunk.original_file.clone()));
			payload_map
				.insert("chunk_index".to_string(), Value::from(i64::from(chunk.chunk_index)));
			payload_map
				.insert("total_chunks".to_string(), Value::from(i64::from(chunk.total_chunks)));
			payload_map.insert("tags".to_string(), Value::from(serde_json::to_string(&chunk.tags)?));
			payload_map.insert(
				"metadata".to_string(),
				Value::from(serde_json::to_string(&chunk.metadata)?),
			);

			points.push(PointStruct::new(
				chunk.chunk_id.to_string(),
				chunk.embedding.clone(),
				Payload::from(payload_map),
			));
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	pub async fn search(&self, vector: Vec<f32>, top_k: u64) -> Result<Vec<RetrievedChunk>> {
		let query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(top_k);
		let response = self.client.query(query).await?;

		Ok(response.result.iter().map(retrieved_from_point).collect())
	}

	pub async fn count(&self) -> Result<u64> {
		let response =
			self.client.count(CountPointsBuilder::new(self.collection.clone()).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}
}

fn retrieved_from_point(point: &ScoredPoint) -> RetrievedChunk {
	let chunk_id = point
		.id
		.as_ref()
		.and_then(|id| id.point_id_options.as_ref())
		.map(|options| match options {
			qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid) => uuid.clone(),
			qdrant_client::qdrant::point_id::PointIdOptions::Num(num) => num.to_string(),
		})
		.unwrap_or_default();
	let tags = payload_str(&point.payload, "tags")
		.and_then(|raw| serde_json::from_str(&raw).ok())
		.unwrap_or_default();
	let metadata = payload_str(&point.payload, "metadata")
		.and_then(|raw| serde_json::from_str(&raw).ok())
		.unwrap_or(serde_json::Value::Null);

	RetrievedChunk {
		chunk_id,
		content: payload_str(&point.payload, "content").unwrap_or_default(),
		source: payload_str(&point.payload, "source").unwrap_or_default(),
		original_file: payload_str(&point.payload, "original_file").unwrap_or_default(),
		chunk_index: payload_i64(&point.payload, "chunk_index").unwrap_or(0),
		total_chunks: payload_i64(&point.payload, "total_chunks").unwrap_or(0),
		tags,
		metadata,
		similarity: point.score,
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match payload.get(key).and_then(|value| value.kind.as_ref()) {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	match payload.get(key).and_then(|value| value.kind.as_ref()) {
		Some(Kind::IntegerValue(value)) => Some(*value),
		_ => None,
	}
}
