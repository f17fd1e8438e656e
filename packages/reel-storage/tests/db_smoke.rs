use uuid::Uuid;

use reel_config::Postgres;
use reel_storage::{
	db::Db,
	models::{NewQuery, NewQueryResult},
	queries,
};
use reel_testkit::TestDatabase;

async fn bootstrap() -> Option<(TestDatabase, Db)> {
	let Some(base_dsn) = reel_testkit::env_dsn() else {
		eprintln!("Skipping storage tests; set REEL_PG_DSN to run this test.");

		return None;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	Some((test_db, db))
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REEL_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some((test_db, db)) = bootstrap().await else {
		return;
	};

	for table in ["sessions", "queries", "messages", "keyframes", "query_results"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "missing table {table}");
	}

	// Re-applying the schema must be a no-op.
	db.ensure_schema().await.expect("Failed to re-apply schema.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REEL_PG_DSN to run."]
async fn query_rows_roundtrip_in_rank_order() {
	let Some((test_db, db)) = bootstrap().await else {
		return;
	};
	let session = queries::insert_session(&db.pool).await.expect("Failed to insert session.");
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let query_id = queries::insert_query(
		&mut tx,
		&NewQuery {
			session_id: session.session_id,
			text_query: Some("red car at night"),
			image_query: None,
			od_json: None,
			ocr_text: None,
			asr_text: None,
		},
	)
	.await
	.expect("Failed to insert query.");

	queries::insert_message(&mut tx, session.session_id, query_id, "user", "Text: red car at night")
		.await
		.expect("Failed to insert message.");
	queries::insert_query_results(
		&mut tx,
		query_id,
		&[
			NewQueryResult { keyframe_id: "f_high".to_string(), rank: 1, score: 0.9 },
			NewQueryResult { keyframe_id: "f_low".to_string(), rank: 2, score: 0.4 },
		],
	)
	.await
	.expect("Failed to insert results.");
	queries::touch_session(&mut tx, session.session_id)
		.await
		.expect("Failed to touch session.");
	tx.commit().await.expect("Failed to commit.");

	let fetched = queries::fetch_session_queries(&db.pool, session.session_id)
		.await
		.expect("Failed to fetch queries.");

	assert_eq!(fetched.len(), 1);
	assert_eq!(fetched[0].text_query.as_deref(), Some("red car at night"));

	let results = queries::fetch_query_results(&db.pool, query_id)
		.await
		.expect("Failed to fetch results.");

	assert_eq!(results.len(), 2);
	assert_eq!(results[0].keyframe_id, "f_high");
	assert_eq!(results[0].rank, 1);
	// The keyframe catalog row does not exist, so joined columns are null.
	assert_eq!(results[0].video_id, None);

	let all = queries::fetch_all_history(&db.pool).await.expect("Failed to fetch all history.");

	assert_eq!(all.len(), 2);
	assert_eq!(all[0].query_id, query_id);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REEL_PG_DSN to run."]
async fn rank_uniqueness_is_enforced_per_query() {
	let Some((test_db, db)) = bootstrap().await else {
		return;
	};
	let session = queries::insert_session(&db.pool).await.expect("Failed to insert session.");
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let query_id = queries::insert_query(
		&mut tx,
		&NewQuery {
			session_id: session.session_id,
			text_query: Some("duplicate rank"),
			image_query: None,
			od_json: None,
			ocr_text: None,
			asr_text: None,
		},
	)
	.await
	.expect("Failed to insert query.");

	tx.commit().await.expect("Failed to commit.");

	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let duplicate = queries::insert_query_results(
		&mut tx,
		query_id,
		&[
			NewQueryResult { keyframe_id: "f1".to_string(), rank: 1, score: 0.9 },
			NewQueryResult { keyframe_id: "f2".to_string(), rank: 1, score: 0.4 },
		],
	)
	.await;

	assert!(duplicate.is_err());

	drop(tx);

	let exists = queries::session_exists(&db.pool, session.session_id)
		.await
		.expect("Failed to check session.");

	assert!(exists);
	assert!(
		!queries::session_exists(&db.pool, Uuid::new_v4())
			.await
			.expect("Failed to check session.")
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
