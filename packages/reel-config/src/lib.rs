mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Postgres, Providers, Qdrant, Retrieval, Security, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}

	for (label, alpha) in
		[("image_alpha", cfg.retrieval.image_alpha), ("text_alpha", cfg.retrieval.text_alpha)]
	{
		if !alpha.is_finite() {
			return Err(Error::Validation {
				message: format!("retrieval.{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&alpha) {
			return Err(Error::Validation {
				message: format!("retrieval.{label} must be in the range 0.0-1.0."),
			});
		}
	}

	for (label, index) in
		[("image_index", &cfg.storage.image_index), ("text_index", &cfg.storage.text_index)]
	{
		if index.url.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("storage.{label}.url must be non-empty."),
			});
		}
		if index.collection.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("storage.{label}.collection must be non-empty."),
			});
		}
		if index.vector_dim == 0 {
			return Err(Error::Validation {
				message: format!("storage.{label}.vector_dim must be greater than zero."),
			});
		}
	}

	for (label, provider, index) in [
		("image_embedding", &cfg.providers.image_embedding, &cfg.storage.image_index),
		("text_embedding", &cfg.providers.text_embedding, &cfg.storage.text_index),
	] {
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_key must be non-empty."),
			});
		}
		if provider.dimensions == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.dimensions must be greater than zero."),
			});
		}
		if provider.dimensions != index.vector_dim {
			return Err(Error::Validation {
				message: format!(
					"providers.{label}.dimensions must match the paired index vector_dim."
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in [&mut cfg.providers.image_embedding, &mut cfg.providers.text_embedding] {
		while provider.api_base.ends_with('/') {
			provider.api_base.pop();
		}
	}
}
