use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub chunking: Chunking,
	pub search: Search,
	pub ingest: Ingest,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub vector: Vector,
	pub data: Data,
}

#[derive(Debug, Deserialize)]
pub struct Vector {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

/// Flat-file state lives under one base directory. The subdirectory layout is
/// fixed; only the root moves between deployments.
#[derive(Debug, Deserialize)]
pub struct Data {
	pub base_dir: PathBuf,
}
impl Data {
	pub fn upload_dir(&self) -> PathBuf {
		self.base_dir.join("upload")
	}

	pub fn ingested_dir(&self) -> PathBuf {
		self.base_dir.join("ingested")
	}

	pub fn separated_dir(&self) -> PathBuf {
		self.base_dir.join("separated")
	}

	pub fn records_file(&self) -> PathBuf {
		self.base_dir.join("documents.jsonl")
	}

	pub fn tag_dictionary_file(&self) -> PathBuf {
		self.base_dir.join("tag_dictionary.json")
	}

	pub fn vision_prompt_file(&self) -> PathBuf {
		self.base_dir.join("prompts").join("vision_image_description.txt")
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
	pub vision: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Chunking {
	pub chunk_size: usize,
	pub chunk_overlap: usize,
	pub separators: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub retrieval_top_k: u64,
	pub rerank_top_k: usize,
	pub recommended_tags_top_k: usize,
}

#[derive(Debug, Deserialize)]
pub struct Ingest {
	pub max_file_size: u64,
	pub pandoc_bin: String,
	pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub admin_token: String,
	pub user_token: String,
}
