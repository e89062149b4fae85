use std::sync::Arc;

use quarry_service::QuarryService;
use quarry_storage::vector::VectorStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<QuarryService>,
}
impl AppState {
	pub fn new(config: quarry_config::Config) -> color_eyre::Result<Self> {
		let vectors = VectorStore::new(&config.storage.vector)?;
		let service = QuarryService::new(config, vectors);

		Ok(Self { service: Arc::new(service) })
	}
}
