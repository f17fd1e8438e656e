pub mod backend;

use reel_config::Config;
use reel_domain::{Modality, ModalityHits};
use reel_providers::EmbedInput;

use crate::{Backends, CreateQueryRequest, Providers, ServiceError, ServiceResult};

/// What one modality's retrieval produced.
pub(crate) enum ModalityOutcome {
	/// The request carried no input for this modality.
	Skipped,
	Retrieved(ModalityHits),
	/// Embedding or search failed; the caller substitutes an empty set.
	Failed,
}

/// Runs the applicable per-modality retrievals concurrently.
///
/// A failed modality degrades to an empty result set so a healthy modality
/// still answers the query; only when every attempted modality fails does the
/// request surface an error.
pub async fn run_retrievals(
	cfg: &Config,
	providers: &Providers,
	backends: &Backends,
	request: &CreateQueryRequest,
	top_k: u32,
) -> ServiceResult<(Option<ModalityHits>, Option<ModalityHits>)> {
	let (image, text) = tokio::join!(
		retrieve_image(cfg, providers, backends, request, top_k),
		retrieve_text(cfg, providers, backends, request, top_k),
	);
	let attempted = [&image, &text]
		.iter()
		.filter(|outcome| !matches!(outcome, ModalityOutcome::Skipped))
		.count();
	let failed = [&image, &text]
		.iter()
		.filter(|outcome| matches!(outcome, ModalityOutcome::Failed))
		.count();

	if attempted > 0 && failed == attempted {
		return Err(ServiceError::Provider {
			message: "All retrieval modalities failed.".to_string(),
		});
	}

	Ok((into_hits(image), into_hits(text)))
}

fn into_hits(outcome: ModalityOutcome) -> Option<ModalityHits> {
	match outcome {
		ModalityOutcome::Skipped => None,
		ModalityOutcome::Retrieved(hits) => Some(hits),
		ModalityOutcome::Failed => Some(ModalityHits::default()),
	}
}

async fn retrieve_image(
	cfg: &Config,
	providers: &Providers,
	backends: &Backends,
	request: &CreateQueryRequest,
	top_k: u32,
) -> ModalityOutcome {
	let Some(image_query) = request.image_query.as_deref().filter(|q| !q.trim().is_empty()) else {
		return ModalityOutcome::Skipped;
	};
	// A reference image arrives as a URL; anything else is a description
	// embedded through the image model's text tower.
	let input = if image_query.starts_with("http://") || image_query.starts_with("https://") {
		EmbedInput::ImageUrl(image_query.to_string())
	} else {
		EmbedInput::Text(image_query.to_string())
	};
	let lexical = request.text_query.as_deref().unwrap_or(image_query);

	retrieve(
		Modality::Image,
		&cfg.providers.image_embedding,
		providers,
		&backends.image,
		input,
		lexical,
		cfg.retrieval.image_alpha,
		top_k,
	)
	.await
}

async fn retrieve_text(
	cfg: &Config,
	providers: &Providers,
	backends: &Backends,
	request: &CreateQueryRequest,
	top_k: u32,
) -> ModalityOutcome {
	let Some(text_query) = request.text_query.as_deref().filter(|q| !q.trim().is_empty()) else {
		return ModalityOutcome::Skipped;
	};

	retrieve(
		Modality::Text,
		&cfg.providers.text_embedding,
		providers,
		&backends.text,
		EmbedInput::Text(text_query.to_string()),
		text_query,
		cfg.retrieval.text_alpha,
		top_k,
	)
	.await
}

#[allow(clippy::too_many_arguments)]
async fn retrieve(
	modality: Modality,
	provider_cfg: &reel_config::EmbeddingProviderConfig,
	providers: &Providers,
	backend: &std::sync::Arc<dyn crate::SearchBackend>,
	input: EmbedInput,
	lexical_query: &str,
	alpha: f32,
	top_k: u32,
) -> ModalityOutcome {
	let vector = match providers.embedding.embed(provider_cfg, &input).await {
		Ok(vector) => vector,
		Err(err) => {
			tracing::warn!(
				modality = modality.as_str(),
				input_kind = input.kind(),
				error = %err,
				"Embedding failed; substituting an empty result set."
			);

			return ModalityOutcome::Failed;
		},
	};

	if vector.len() != provider_cfg.dimensions as usize {
		tracing::warn!(
			modality = modality.as_str(),
			expected = provider_cfg.dimensions,
			got = vector.len(),
			"Embedding vector dimension mismatch; substituting an empty result set."
		);

		return ModalityOutcome::Failed;
	}

	match backend.hybrid_search(lexical_query, &vector, alpha, top_k).await {
		Ok(hits) => ModalityOutcome::Retrieved(hits),
		Err(err) => {
			tracing::warn!(
				modality = modality.as_str(),
				error = %err,
				"Hybrid search failed; substituting an empty result set."
			);

			ModalityOutcome::Failed
		},
	}
}
