use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Input for one embedding call. The provider rejects inputs that do not
/// match their declared kind before any network traffic happens.
#[derive(Debug, Clone)]
pub enum EmbedInput {
	Text(String),
	ImageUrl(String),
}
impl EmbedInput {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Text(_) => "text",
			Self::ImageUrl(_) => "image",
		}
	}
}

/// Embeds a single text or image-URL input and returns its vector.
///
/// Transient transport failures (timeouts, refused connections, 5xx) are
/// retried up to `cfg.max_retries` times with exponential backoff.
pub async fn embed(
	cfg: &reel_config::EmbeddingProviderConfig,
	input: &EmbedInput,
) -> Result<Vec<f32>> {
	let body = request_body(cfg, input)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let mut attempt = 0_u32;
	let json: Value = loop {
		let outcome = client
			.post(&url)
			.headers(headers.clone())
			.json(&body)
			.send()
			.await
			.and_then(|res| res.error_for_status());

		match outcome {
			Ok(res) => break res.json().await?,
			Err(err) if attempt < cfg.max_retries && retryable(&err) => {
				attempt += 1;

				let backoff = cfg.retry_backoff_ms.saturating_mul(1 << (attempt - 1).min(10));

				tokio::time::sleep(Duration::from_millis(backoff)).await;
			},
			Err(err) => return Err(err.into()),
		}
	};
	let vectors = parse_embedding_response(json)?;

	vectors.into_iter().next().ok_or_else(|| Error::InvalidResponse {
		message: "Embedding response contained no vectors.".to_string(),
	})
}

fn request_body(cfg: &reel_config::EmbeddingProviderConfig, input: &EmbedInput) -> Result<Value> {
	match input {
		EmbedInput::Text(text) => {
			if text.trim().is_empty() {
				return Err(Error::InvalidInput {
					message: "Text input must be non-empty.".to_string(),
				});
			}

			Ok(serde_json::json!({
				"model": cfg.model,
				"input": [text],
				"dimensions": cfg.dimensions,
			}))
		},
		EmbedInput::ImageUrl(url) => {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(Error::InvalidInput {
					message: "Image input must be an http(s) URL.".to_string(),
				});
			}

			Ok(serde_json::json!({
				"model": cfg.model,
				"input": [{ "image": url }],
				"dimensions": cfg.dimensions,
			}))
		},
	}
}

fn retryable(err: &reqwest::Error) -> bool {
	err.is_timeout()
		|| err.is_connect()
		|| err.status().map(|status| status.is_server_error()).unwrap_or(false)
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;
		let mut vec = Vec::with_capacity(embedding.len());
		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;
			vec.push(number as f32);
		}
		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json).expect("parse failed");
		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn rejects_missing_data_array() {
		let json = serde_json::json!({ "error": "boom" });

		assert!(parse_embedding_response(json).is_err());
	}
}
