use std::sync::Arc;

use reel_service::ReelService;
use reel_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ReelService>,
}
impl AppState {
	pub async fn new(config: reel_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let image_index = QdrantStore::new(&config.storage.image_index)?;
		let text_index = QdrantStore::new(&config.storage.text_index)?;
		let service = ReelService::new(config, db, image_index, text_index);

		Ok(Self { service: Arc::new(service) })
	}
}
