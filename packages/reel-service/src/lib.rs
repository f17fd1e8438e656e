pub mod history;
pub mod query;
pub mod search;
pub mod session;
pub mod time_serde;

use std::{future::Future, pin::Pin, sync::Arc};

pub use history::{AllHistoryResponse, HistoryItem, HistoryResponse, HistoryResult};
pub use query::{CreateQueryRequest, CreateQueryResponse, QueryResultItem};
pub use search::backend::QdrantSearchBackend;
pub use session::{SessionInfo, SessionResponse};

use reel_config::{Config, EmbeddingProviderConfig};
use reel_domain::ModalityHits;
use reel_providers::{EmbedInput, embedding};
use reel_storage::{db::Db, qdrant::QdrantStore};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		input: &'a EmbedInput,
	) -> BoxFuture<'a, reel_providers::Result<Vec<f32>>>;
}

/// One hybrid-searchable vector index, behind a fixed adapter contract:
/// whatever the engine returns is converted into [`ModalityHits`] with
/// higher-is-better relevance in [0, 1].
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn hybrid_search<'a>(
		&'a self,
		query: &'a str,
		vector: &'a [f32],
		alpha: f32,
		top_k: u32,
	) -> BoxFuture<'a, ServiceResult<ModalityHits>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	NotFound { message: String },
	Provider { message: String },
	VectorSearch { message: String },
	Storage { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

#[derive(Clone)]
pub struct Backends {
	pub image: Arc<dyn SearchBackend>,
	pub text: Arc<dyn SearchBackend>,
}

pub struct ReelService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
	pub backends: Backends,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::NotFound { message } => write!(f, "Not found: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::VectorSearch { message } => write!(f, "Vector search error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<reel_storage::Error> for ServiceError {
	fn from(err: reel_storage::Error) -> Self {
		match err {
			reel_storage::Error::NotFound(message) => Self::NotFound { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<reel_providers::Error> for ServiceError {
	fn from(err: reel_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		input: &'a EmbedInput,
	) -> BoxFuture<'a, reel_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(cfg, input))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

impl Backends {
	pub fn new(image: Arc<dyn SearchBackend>, text: Arc<dyn SearchBackend>) -> Self {
		Self { image, text }
	}
}

impl ReelService {
	pub fn new(cfg: Config, db: Db, image_index: QdrantStore, text_index: QdrantStore) -> Self {
		let backends = Backends {
			image: Arc::new(QdrantSearchBackend::new(image_index)),
			text: Arc::new(QdrantSearchBackend::new(text_index)),
		};

		Self { cfg, db, providers: Providers::default(), backends }
	}

	pub fn with_parts(cfg: Config, db: Db, providers: Providers, backends: Backends) -> Self {
		Self { cfg, db, providers, backends }
	}

	/// Storage connectivity probe for the health endpoint.
	pub async fn ping(&self) -> ServiceResult<()> {
		sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.db.pool).await?;

		Ok(())
	}
}
