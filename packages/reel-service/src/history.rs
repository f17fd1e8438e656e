use std::collections::HashMap;

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use reel_storage::{
	models::{AllHistoryRow, QueryResultRow, QueryRow},
	queries,
};

use crate::{ReelService, ServiceError, ServiceResult};

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryResult {
	pub keyframe_id: String,
	pub video_id: Option<String>,
	pub frame_number: Option<i32>,
	pub timestamp_ms: Option<i64>,
	pub image_url: Option<String>,
	pub metadata: Value,
	pub rank: i32,
	pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryItem {
	pub query_id: Uuid,
	pub session_id: Uuid,
	pub text_query: Option<String>,
	pub image_query: Option<String>,
	pub od_json: Option<String>,
	pub ocr_text: Option<String>,
	pub asr_text: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub query_time: OffsetDateTime,
	pub results: Vec<HistoryResult>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryResponse {
	pub session_id: Uuid,
	pub queries: Vec<HistoryItem>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AllHistoryResponse {
	pub history: Vec<HistoryItem>,
}

impl ReelService {
	pub async fn history(&self, session_id: Uuid) -> ServiceResult<HistoryResponse> {
		let query_rows = queries::fetch_session_queries(&self.db.pool, session_id).await?;

		if query_rows.is_empty() {
			return Err(ServiceError::NotFound {
				message: format!("No history found for session {session_id}."),
			});
		}

		let mut items = Vec::with_capacity(query_rows.len());

		for row in query_rows {
			let results = queries::fetch_query_results(&self.db.pool, row.query_id)
				.await?
				.into_iter()
				.map(history_result)
				.collect();

			items.push(history_item(row, results));
		}

		Ok(HistoryResponse { session_id, queries: items })
	}

	/// All queries across sessions, newest first, each with its ranked
	/// results. Grouped from one flattened join so result order follows the
	/// SQL `rank ASC` ordering.
	pub async fn all_history(&self) -> ServiceResult<AllHistoryResponse> {
		let rows = queries::fetch_all_history(&self.db.pool).await?;
		let mut history: Vec<HistoryItem> = Vec::new();
		let mut index: HashMap<Uuid, usize> = HashMap::new();

		for row in rows {
			let slot = match index.get(&row.query_id).copied() {
				Some(slot) => slot,
				None => {
					index.insert(row.query_id, history.len());
					history.push(HistoryItem {
						query_id: row.query_id,
						session_id: row.session_id,
						text_query: row.text_query.clone(),
						image_query: row.image_query.clone(),
						od_json: row.od_json.clone(),
						ocr_text: row.ocr_text.clone(),
						asr_text: row.asr_text.clone(),
						query_time: row.query_time,
						results: Vec::new(),
					});

					history.len() - 1
				},
			};

			if let Some(result) = all_history_result(row) {
				history[slot].results.push(result);
			}
		}

		Ok(AllHistoryResponse { history })
	}
}

fn history_item(row: QueryRow, results: Vec<HistoryResult>) -> HistoryItem {
	HistoryItem {
		query_id: row.query_id,
		session_id: row.session_id,
		text_query: row.text_query,
		image_query: row.image_query,
		od_json: row.od_json,
		ocr_text: row.ocr_text,
		asr_text: row.asr_text,
		query_time: row.created_at,
		results,
	}
}

fn history_result(row: QueryResultRow) -> HistoryResult {
	HistoryResult {
		keyframe_id: row.keyframe_id,
		video_id: row.video_id,
		frame_number: row.frame_number,
		timestamp_ms: row.timestamp_ms,
		image_url: row.image_url,
		metadata: row.metadata.unwrap_or_else(|| serde_json::json!({})),
		rank: row.rank,
		score: row.score,
	}
}

fn all_history_result(row: AllHistoryRow) -> Option<HistoryResult> {
	let keyframe_id = row.keyframe_id?;
	let rank = row.rank?;
	let score = row.score?;

	Some(HistoryResult {
		keyframe_id,
		video_id: row.video_id,
		frame_number: row.frame_number,
		timestamp_ms: row.timestamp_ms,
		image_url: row.image_url,
		metadata: row.metadata.unwrap_or_else(|| serde_json::json!({})),
		rank,
		score,
	})
}
