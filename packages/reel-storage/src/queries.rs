use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
	Result,
	models::{AllHistoryRow, NewQuery, NewQueryResult, QueryResultRow, QueryRow, SessionRow},
};

pub async fn insert_session(pool: &PgPool) -> Result<SessionRow> {
	let row = sqlx::query_as::<_, SessionRow>(
		"\
INSERT INTO sessions DEFAULT VALUES
RETURNING session_id, created_at, last_updated",
	)
	.fetch_one(pool)
	.await?;

	Ok(row)
}

pub async fn list_sessions(pool: &PgPool) -> Result<Vec<SessionRow>> {
	let rows = sqlx::query_as::<_, SessionRow>(
		"\
SELECT session_id, created_at, last_updated
FROM sessions
ORDER BY created_at DESC",
	)
	.fetch_all(pool)
	.await?;

	Ok(rows)
}

pub async fn session_exists(pool: &PgPool, session_id: Uuid) -> Result<bool> {
	let exists = sqlx::query_scalar::<_, bool>(
		"SELECT EXISTS (SELECT 1 FROM sessions WHERE session_id = $1)",
	)
	.bind(session_id)
	.fetch_one(pool)
	.await?;

	Ok(exists)
}

pub async fn touch_session(
	tx: &mut Transaction<'_, Postgres>,
	session_id: Uuid,
) -> Result<()> {
	sqlx::query("UPDATE sessions SET last_updated = now() WHERE session_id = $1")
		.bind(session_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn insert_query(
	tx: &mut Transaction<'_, Postgres>,
	query: &NewQuery<'_>,
) -> Result<Uuid> {
	let query_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO queries (session_id, text_query, image_query, od_json, ocr_text, asr_text)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING query_id",
	)
	.bind(query.session_id)
	.bind(query.text_query)
	.bind(query.image_query)
	.bind(query.od_json)
	.bind(query.ocr_text)
	.bind(query.asr_text)
	.fetch_one(&mut **tx)
	.await?;

	Ok(query_id)
}

pub async fn insert_message(
	tx: &mut Transaction<'_, Postgres>,
	session_id: Uuid,
	query_id: Uuid,
	role: &str,
	content: &str,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO messages (session_id, query_id, role, content)
VALUES ($1, $2, $3, $4)",
	)
	.bind(session_id)
	.bind(query_id)
	.bind(role)
	.bind(content)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

/// Inserts ranked result rows for one query. Rows are written in the order
/// given; queries are immutable after insert, so this runs exactly once per
/// query inside the request transaction.
pub async fn insert_query_results(
	tx: &mut Transaction<'_, Postgres>,
	query_id: Uuid,
	results: &[NewQueryResult],
) -> Result<()> {
	for result in results {
		sqlx::query(
			"\
INSERT INTO query_results (query_id, keyframe_id, rank, score)
VALUES ($1, $2, $3, $4)",
		)
		.bind(query_id)
		.bind(result.keyframe_id.as_str())
		.bind(result.rank)
		.bind(result.score)
		.execute(&mut **tx)
		.await?;
	}

	Ok(())
}

pub async fn fetch_session_queries(pool: &PgPool, session_id: Uuid) -> Result<Vec<QueryRow>> {
	let rows = sqlx::query_as::<_, QueryRow>(
		"\
SELECT query_id, session_id, text_query, image_query, od_json, ocr_text, asr_text, created_at
FROM queries
WHERE session_id = $1
ORDER BY created_at ASC",
	)
	.bind(session_id)
	.fetch_all(pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_query_results(pool: &PgPool, query_id: Uuid) -> Result<Vec<QueryResultRow>> {
	let rows = sqlx::query_as::<_, QueryResultRow>(
		"\
SELECT
	qr.keyframe_id,
	k.video_id,
	k.frame_number,
	k.timestamp_ms,
	k.image_url,
	k.metadata,
	qr.rank,
	qr.score
FROM query_results qr
LEFT JOIN keyframes k ON qr.keyframe_id = k.keyframe_id
WHERE qr.query_id = $1
ORDER BY qr.rank ASC",
	)
	.bind(query_id)
	.fetch_all(pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_all_history(pool: &PgPool) -> Result<Vec<AllHistoryRow>> {
	let rows = sqlx::query_as::<_, AllHistoryRow>(
		"\
SELECT
	q.query_id,
	q.session_id,
	q.text_query,
	q.image_query,
	q.od_json,
	q.ocr_text,
	q.asr_text,
	q.created_at AS query_time,
	qr.keyframe_id,
	k.video_id,
	k.frame_number,
	k.timestamp_ms,
	k.image_url,
	k.metadata,
	qr.rank,
	qr.score
FROM queries q
LEFT JOIN query_results qr ON q.query_id = qr.query_id
LEFT JOIN keyframes k ON qr.keyframe_id = k.keyframe_id
ORDER BY query_time DESC, qr.rank ASC",
	)
	.fetch_all(pool)
	.await?;

	Ok(rows)
}
