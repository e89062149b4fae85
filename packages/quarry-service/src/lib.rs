pub mod docs;
pub mod ingest;
pub mod pipeline;
pub mod search;
pub mod stats;
pub mod tags;

use std::{future::Future, pin::Pin, sync::Arc};

pub use docs::DocumentMetadata;
pub use ingest::IngestResponse;
pub use search::{SearchRequest, SearchResponse, SearchResult, TagRecommendation};
pub use stats::StatsResponse;
pub use tags::TagDictionary;

use quarry_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use quarry_extract::ExtractorRegistry;
use quarry_providers::{embedding, tagging, vision};
use quarry_storage::{tags::TagStore, vector::VectorStore};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait TaggingProvider
where
	Self: Send + Sync,
{
	fn select_tags<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		content: &'a str,
		dictionary: &'a [String],
	) -> BoxFuture<'a, Vec<String>>;
}

pub trait VisionProvider
where
	Self: Send + Sync,
{
	fn describe<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		image_name: &'a str,
		image_data: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Provider { message: String },
	Storage { message: String },
	Vector { message: String },
}

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Vector { message } => write!(f, "Vector store error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<quarry_storage::Error> for ServiceError {
	fn from(err: quarry_storage::Error) -> Self {
		match err {
			quarry_storage::Error::Qdrant(inner) => Self::Vector { message: inner.to_string() },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<std::io::Error> for ServiceError {
	fn from(err: std::io::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub tagging: Arc<dyn TaggingProvider>,
	pub vision: Arc<dyn VisionProvider>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, text))
	}
}

impl TaggingProvider for DefaultProviders {
	fn select_tags<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		content: &'a str,
		dictionary: &'a [String],
	) -> BoxFuture<'a, Vec<String>> {
		Box::pin(tagging::select_tags(cfg, content, dictionary))
	}
}

impl VisionProvider for DefaultProviders {
	fn describe<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		image_name: &'a str,
		image_data: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(vision::describe(cfg, prompt, image_name, image_data))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		tagging: Arc<dyn TaggingProvider>,
		vision: Arc<dyn VisionProvider>,
	) -> Self {
		Self { embedding, tagging, vision }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), tagging: provider.clone(), vision: provider }
	}
}

pub struct QuarryService {
	pub cfg: Config,
	pub vectors: VectorStore,
	pub tag_store: TagStore,
	pub extractors: ExtractorRegistry,
	pub providers: Providers,
}
impl QuarryService {
	pub fn new(cfg: Config, vectors: VectorStore) -> Self {
		let tag_store = TagStore::new(cfg.storage.data.tag_dictionary_file());
		let extractors = ExtractorRegistry::standard(&cfg.ingest.pandoc_bin);

		Self { cfg, vectors, tag_store, extractors, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, vectors: VectorStore, providers: Providers) -> Self {
		let tag_store = TagStore::new(cfg.storage.data.tag_dictionary_file());
		let extractors = ExtractorRegistry::standard(&cfg.ingest.pandoc_bin);

		Self { cfg, vectors, tag_store, extractors, providers }
	}
}
