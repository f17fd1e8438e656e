use serde_json::Value;
use uuid::Uuid;

use reel_domain::MergedEntity;
use reel_storage::{
	models::{NewQuery, NewQueryResult},
	queries,
};

use crate::{ReelService, ServiceError, ServiceResult, search};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CreateQueryRequest {
	pub text_query: Option<String>,
	pub image_query: Option<String>,
	pub od_json: Option<String>,
	pub ocr_text: Option<String>,
	pub asr_text: Option<String>,
	pub top_k: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryResultItem {
	pub frame_id: Option<String>,
	pub properties: Value,
	pub image_score: f32,
	pub text_score: f32,
	pub total_score: f32,
	pub rank: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CreateQueryResponse {
	pub query_id: Uuid,
	pub session_id: Uuid,
	pub results: Vec<QueryResultItem>,
}

impl ReelService {
	/// Runs the full query pipeline: validate, retrieve per modality, merge,
	/// persist, respond. Persistence is one transaction; a failed insert
	/// rolls back the query row so no orphaned query survives.
	pub async fn create_query(
		&self,
		session_id: Uuid,
		request: CreateQueryRequest,
	) -> ServiceResult<CreateQueryResponse> {
		let has_text =
			request.text_query.as_deref().map(|q| !q.trim().is_empty()).unwrap_or(false);
		let has_image =
			request.image_query.as_deref().map(|q| !q.trim().is_empty()).unwrap_or(false);

		if !has_text && !has_image {
			return Err(ServiceError::InvalidRequest {
				message: "Provide at least one of text_query or image_query.".to_string(),
			});
		}
		if !queries::session_exists(&self.db.pool, session_id).await? {
			return Err(ServiceError::NotFound {
				message: format!("Session {session_id} does not exist."),
			});
		}

		let top_k = request.top_k.unwrap_or(self.cfg.retrieval.top_k);
		let (image_hits, text_hits) =
			search::run_retrievals(&self.cfg, &self.providers, &self.backends, &request, top_k)
				.await?;
		let merged = reel_domain::merge(image_hits, text_hits);

		tracing::info!(
			%session_id,
			has_text,
			has_image,
			merged = merged.len(),
			"Query retrieval merged."
		);

		let mut tx = self.db.pool.begin().await?;
		let query_id = queries::insert_query(
			&mut tx,
			&NewQuery {
				session_id,
				text_query: request.text_query.as_deref(),
				image_query: request.image_query.as_deref(),
				od_json: request.od_json.as_deref(),
				ocr_text: request.ocr_text.as_deref(),
				asr_text: request.asr_text.as_deref(),
			},
		)
		.await?;

		if let Some(content) = user_message_content(&request) {
			queries::insert_message(&mut tx, session_id, query_id, "user", &content).await?;
		}

		queries::insert_query_results(&mut tx, query_id, &ranked_rows(&merged)).await?;
		queries::touch_session(&mut tx, session_id).await?;
		tx.commit().await?;

		let results = merged
			.into_iter()
			.enumerate()
			.map(|(idx, entity)| QueryResultItem {
				frame_id: entity.frame_id,
				properties: entity.properties,
				image_score: entity.image_score,
				text_score: entity.text_score,
				total_score: entity.total_score,
				rank: idx as u32 + 1,
			})
			.collect();

		Ok(CreateQueryResponse { query_id, session_id, results })
	}
}

fn user_message_content(request: &CreateQueryRequest) -> Option<String> {
	let mut parts = Vec::new();

	if let Some(text) = request.text_query.as_deref().filter(|q| !q.is_empty()) {
		parts.push(format!("Text: {text}"));
	}
	if let Some(image) = request.image_query.as_deref().filter(|q| !q.is_empty()) {
		parts.push(format!("Image: {image}"));
	}

	(!parts.is_empty()).then(|| parts.join(" | "))
}

/// Rows for `query_results`, keeping the merged rank space. Entities without
/// an identity have no keyframe to reference and are not persisted.
fn ranked_rows(merged: &[MergedEntity]) -> Vec<NewQueryResult> {
	merged
		.iter()
		.enumerate()
		.filter_map(|(idx, entity)| {
			entity.frame_id.as_ref().map(|frame_id| NewQueryResult {
				keyframe_id: frame_id.clone(),
				rank: idx as i32 + 1,
				score: entity.total_score,
			})
		})
		.collect()
}
