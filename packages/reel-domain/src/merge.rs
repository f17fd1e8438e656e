use std::{cmp::Ordering, collections::HashMap};

use serde_json::Value;

use crate::identity::extract_identity;

/// Which retrieval path produced a hit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
	Image,
	Text,
}
impl Modality {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Image => "image",
			Self::Text => "text",
		}
	}
}

/// The full hit list for one modality source: parallel property payloads and
/// relevance values.
///
/// A `None` score means "no relevance signal"; it is coerced to `0.0` only
/// when scores are combined, so an unscored hit neither drops out nor ranks
/// as a negative contributor.
#[derive(Debug, Clone, Default)]
pub struct ModalityHits {
	properties: Vec<Value>,
	scores: Vec<Option<f32>>,
}
impl ModalityHits {
	/// Aligns the two lists: the score list is padded with `None` (or cut)
	/// until it matches the properties length. Properties are never truncated.
	pub fn new(properties: Vec<Value>, mut scores: Vec<Option<f32>>) -> Self {
		scores.truncate(properties.len());
		scores.resize(properties.len(), None);

		Self { properties, scores }
	}

	pub fn len(&self) -> usize {
		self.properties.len()
	}

	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}

	pub fn properties(&self) -> &[Value] {
		&self.properties
	}

	pub fn scores(&self) -> &[Option<f32>] {
		&self.scores
	}

	fn into_pairs(self) -> impl Iterator<Item = (Value, Option<f32>)> {
		self.properties.into_iter().zip(self.scores)
	}
}

/// A deduplicated keyframe entity with per-source scores.
///
/// `frame_id` is `None` for hits whose payload carries no recognizable
/// identity; all such hits collapse into a single entity.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MergedEntity {
	pub frame_id: Option<String>,
	pub properties: Value,
	pub image_score: f32,
	pub text_score: f32,
	pub total_score: f32,
}

/// Fuses per-modality hit lists into a single deduplicated ranked list.
///
/// Sources are scanned in a fixed order (image first, then text), each in its
/// original engine order. The first hit for an identity creates the entity;
/// later hits may only fill in an empty payload, never replace a non-empty
/// one. Each hit assigns its coerced score to the field matching its source.
/// The result is sorted by `total_score` descending; entities with equal
/// totals keep first-seen insertion order.
pub fn merge(image: Option<ModalityHits>, text: Option<ModalityHits>) -> Vec<MergedEntity> {
	let mut entities: Vec<MergedEntity> = Vec::new();
	let mut index: HashMap<Option<String>, usize> = HashMap::new();

	for (modality, hits) in [(Modality::Image, image), (Modality::Text, text)] {
		let Some(hits) = hits else {
			continue;
		};

		for (properties, score) in hits.into_pairs() {
			let frame_id = extract_identity(&properties);
			let slot = match index.get(&frame_id).copied() {
				Some(slot) => {
					let entity = &mut entities[slot];

					if payload_is_empty(&entity.properties) && !payload_is_empty(&properties) {
						entity.properties = properties;
					}

					slot
				},
				None => {
					index.insert(frame_id.clone(), entities.len());
					entities.push(MergedEntity {
						frame_id,
						properties,
						image_score: 0.0,
						text_score: 0.0,
						total_score: 0.0,
					});

					entities.len() - 1
				},
			};
			let relevance = score.unwrap_or(0.0);

			match modality {
				Modality::Image => entities[slot].image_score = relevance,
				Modality::Text => entities[slot].text_score = relevance,
			}
		}
	}

	for entity in &mut entities {
		entity.total_score = entity.image_score + entity.text_score;
	}

	// Vec::sort_by is stable, so equal totals retain insertion order.
	entities.sort_by(|left, right| cmp_f32_desc(left.total_score, right.total_score));

	entities
}

/// Whether a payload counts as empty for the backfill rule: a later, richer
/// payload may replace it, but never a non-empty one already stored.
pub fn payload_is_empty(properties: &Value) -> bool {
	match properties {
		Value::Null => true,
		Value::String(text) => text.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(map) => map.is_empty(),
		_ => false,
	}
}

fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
