use serde_json::json;

use reel_domain::{MergedEntity, ModalityHits, merge};

fn hits(properties: Vec<serde_json::Value>, scores: Vec<Option<f32>>) -> ModalityHits {
	ModalityHits::new(properties, scores)
}

fn keys(entities: &[MergedEntity]) -> Vec<Option<&str>> {
	entities.iter().map(|entity| entity.frame_id.as_deref()).collect()
}

#[test]
fn empty_inputs_yield_empty_output() {
	assert!(merge(None, None).is_empty());
	assert!(merge(Some(ModalityHits::default()), Some(ModalityHits::default())).is_empty());
}

#[test]
fn deduplicates_across_sources() {
	let image = hits(vec![json!({ "id": "f1" })], vec![Some(0.6)]);
	let text = hits(vec![json!({ "id": "f1" })], vec![Some(0.3)]);
	let merged = merge(Some(image), Some(text));

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].frame_id.as_deref(), Some("f1"));
	assert_eq!(merged[0].image_score, 0.6);
	assert_eq!(merged[0].text_score, 0.3);
	assert!((merged[0].total_score - 0.9).abs() < 1e-6);
}

#[test]
fn null_score_coerces_to_zero_without_dropping_the_hit() {
	let image = hits(vec![json!({ "id": "f1" })], vec![None]);
	let merged = merge(Some(image), None);

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].image_score, 0.0);
	assert_eq!(merged[0].total_score, 0.0);
}

#[test]
fn sorts_descending_with_stable_ties() {
	let image = hits(
		vec![json!({ "id": "e0" }), json!({ "id": "e1" }), json!({ "id": "e2" })],
		vec![Some(0.9), Some(0.5), Some(0.9)],
	);
	let merged = merge(Some(image), None);

	assert_eq!(keys(&merged), vec![Some("e0"), Some("e2"), Some("e1")]);
}

#[test]
fn backfills_empty_payload_from_a_later_source() {
	let image = hits(vec![json!({})], vec![Some(0.4)]);
	let text = hits(vec![json!({ "id": "f2", "title": "cat" })], vec![Some(0.2)]);
	let merged = merge(Some(image), Some(text));

	// The empty image payload has no identity; the text hit is a separate
	// entity carrying the full payload.
	let entity = merged
		.iter()
		.find(|entity| entity.frame_id.as_deref() == Some("f2"))
		.expect("f2 entity missing");

	assert_eq!(entity.properties, json!({ "id": "f2", "title": "cat" }));
}

#[test]
fn backfills_empty_payload_for_the_same_identity() {
	// Only identity-less payloads can be empty, so the backfill rule fires on
	// the sentinel entity: a null placeholder filled by a later rich payload.
	let image = hits(vec![serde_json::Value::Null], vec![Some(0.4)]);
	let text = hits(vec![json!({ "caption": "sunset over harbor" })], vec![Some(0.5)]);
	let merged = merge(Some(image), Some(text));

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].frame_id, None);
	assert_eq!(merged[0].properties, json!({ "caption": "sunset over harbor" }));
	assert_eq!(merged[0].image_score, 0.4);
	assert_eq!(merged[0].text_score, 0.5);
}

#[test]
fn never_overwrites_a_non_empty_payload() {
	let image = hits(vec![json!({ "id": "f3", "title": "dog" })], vec![Some(0.4)]);
	let text = hits(vec![json!({ "id": "f3", "title": "wolf" })], vec![Some(0.2)]);
	let merged = merge(Some(image), Some(text));

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].properties, json!({ "id": "f3", "title": "dog" }));
}

#[test]
fn pads_short_score_lists_to_the_properties_length() {
	let properties = vec![
		json!({ "id": "a" }),
		json!({ "id": "b" }),
		json!({ "id": "c" }),
		json!({ "id": "d" }),
		json!({ "id": "e" }),
	];
	let aligned = ModalityHits::new(properties, vec![Some(0.9), Some(0.8), Some(0.7)]);

	assert_eq!(aligned.len(), 5);
	assert_eq!(aligned.scores().len(), 5);
	assert_eq!(aligned.scores()[3], None);
	assert_eq!(aligned.scores()[4], None);

	let merged = merge(None, Some(aligned));

	assert_eq!(merged.len(), 5);
	assert_eq!(merged[4].total_score, 0.0);
}

#[test]
fn merges_the_documented_scenario_in_exact_order() {
	let image = hits(vec![json!({ "id": "a" }), json!({ "id": "b" })], vec![Some(0.7), Some(0.4)]);
	let text = hits(vec![json!({ "id": "b" }), json!({ "id": "c" })], vec![Some(0.9), Some(0.2)]);
	let merged = merge(Some(image), Some(text));

	assert_eq!(keys(&merged), vec![Some("b"), Some("a"), Some("c")]);
	assert!((merged[0].total_score - 1.3).abs() < 1e-6);
	assert!((merged[1].total_score - 0.7).abs() < 1e-6);
	assert!((merged[2].total_score - 0.2).abs() < 1e-6);
}

#[test]
fn hits_without_identity_collapse_into_one_entity() {
	// Documented policy: undefined identities share the sentinel key, so
	// distinct unidentifiable payloads fold into a single entity.
	let image = hits(
		vec![json!({ "caption": "first" }), json!({ "caption": "second" })],
		vec![Some(0.8), Some(0.1)],
	);
	let text = hits(vec![json!({ "caption": "third" })], vec![Some(0.5)]);
	let merged = merge(Some(image), Some(text));

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].frame_id, None);
	assert_eq!(merged[0].properties, json!({ "caption": "first" }));
	// Later hits for the sentinel keep reassigning their source's score.
	assert_eq!(merged[0].image_score, 0.1);
	assert_eq!(merged[0].text_score, 0.5);
}

#[test]
fn repeat_within_a_source_reassigns_that_sources_score() {
	let image = hits(
		vec![json!({ "id": "f1" }), json!({ "id": "f1" })],
		vec![Some(0.9), Some(0.2)],
	);
	let merged = merge(Some(image), None);

	assert_eq!(merged.len(), 1);
	assert_eq!(merged[0].image_score, 0.2);
}

#[test]
fn unscored_entities_rank_after_scored_ones() {
	let image = hits(vec![json!({ "id": "low" })], vec![None]);
	let text = hits(vec![json!({ "id": "high" })], vec![Some(0.1)]);
	let merged = merge(Some(image), Some(text));

	assert_eq!(keys(&merged), vec![Some("high"), Some("low")]);
}
