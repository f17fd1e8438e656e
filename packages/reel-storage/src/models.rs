use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct SessionRow {
	pub session_id: Uuid,
	pub created_at: OffsetDateTime,
	pub last_updated: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct QueryRow {
	pub query_id: Uuid,
	pub session_id: Uuid,
	pub text_query: Option<String>,
	pub image_query: Option<String>,
	pub od_json: Option<String>,
	pub ocr_text: Option<String>,
	pub asr_text: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewQuery<'a> {
	pub session_id: Uuid,
	pub text_query: Option<&'a str>,
	pub image_query: Option<&'a str>,
	pub od_json: Option<&'a str>,
	pub ocr_text: Option<&'a str>,
	pub asr_text: Option<&'a str>,
}

#[derive(Debug)]
pub struct NewQueryResult {
	pub keyframe_id: String,
	pub rank: i32,
	pub score: f32,
}

/// One ranked result row joined against the keyframe catalog. Keyframe
/// columns are nullable because the catalog row may not exist yet.
#[derive(Debug, sqlx::FromRow)]
pub struct QueryResultRow {
	pub keyframe_id: String,
	pub video_id: Option<String>,
	pub frame_number: Option<i32>,
	pub timestamp_ms: Option<i64>,
	pub image_url: Option<String>,
	pub metadata: Option<Value>,
	pub rank: i32,
	pub score: f32,
}

/// Flattened row of the all-history join: query columns plus an optional
/// result/keyframe tail for queries with no results.
#[derive(Debug, sqlx::FromRow)]
pub struct AllHistoryRow {
	pub query_id: Uuid,
	pub session_id: Uuid,
	pub text_query: Option<String>,
	pub image_query: Option<String>,
	pub od_json: Option<String>,
	pub ocr_text: Option<String>,
	pub asr_text: Option<String>,
	pub query_time: OffsetDateTime,
	pub keyframe_id: Option<String>,
	pub video_id: Option<String>,
	pub frame_number: Option<i32>,
	pub timestamp_ms: Option<i64>,
	pub image_url: Option<String>,
	pub metadata: Option<Value>,
	pub rank: Option<i32>,
	pub score: Option<f32>,
}
