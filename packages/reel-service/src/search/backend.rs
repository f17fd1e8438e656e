use std::{cmp::Ordering, collections::HashMap};

use qdrant_client::qdrant::{
	Document, Query, QueryPointsBuilder, ScoredPoint, Value as QdrantValue,
	point_id::PointIdOptions, value::Kind,
};
use serde_json::Value;

use reel_domain::ModalityHits;
use reel_storage::qdrant::{BM25_MODEL, BM25_VECTOR_NAME, DENSE_VECTOR_NAME, QdrantStore};

use crate::{BoxFuture, SearchBackend, ServiceError, ServiceResult};

/// Qdrant adapter for one keyframe index.
///
/// The engine has no weighted fusion knob, so the two branches (dense
/// vector, BM25 lexical) are queried side by side and combined with the
/// documented relative-score fusion: each branch's scores are min-max
/// normalized to [0, 1] and blended as `alpha * dense + (1 - alpha) *
/// lexical`. The output is therefore always higher-is-better in [0, 1],
/// which is what the merge layer's summation assumes.
pub struct QdrantSearchBackend {
	store: QdrantStore,
}
impl QdrantSearchBackend {
	pub fn new(store: QdrantStore) -> Self {
		Self { store }
	}
}

impl SearchBackend for QdrantSearchBackend {
	fn hybrid_search<'a>(
		&'a self,
		query: &'a str,
		vector: &'a [f32],
		alpha: f32,
		top_k: u32,
	) -> BoxFuture<'a, ServiceResult<ModalityHits>> {
		Box::pin(async move {
			let dense = QueryPointsBuilder::new(self.store.collection.clone())
				.query(Query::new_nearest(vector.to_vec()))
				.using(DENSE_VECTOR_NAME)
				.with_payload(true)
				.limit(top_k as u64);
			let lexical = QueryPointsBuilder::new(self.store.collection.clone())
				.query(Query::new_nearest(Document::new(query.to_string(), BM25_MODEL)))
				.using(BM25_VECTOR_NAME)
				.with_payload(true)
				.limit(top_k as u64);
			let (dense_res, lexical_res) =
				tokio::join!(self.store.client.query(dense), self.store.client.query(lexical));
			let dense_points = dense_res
				.map_err(|err| ServiceError::VectorSearch { message: err.to_string() })?
				.result;
			let lexical_points = lexical_res
				.map_err(|err| ServiceError::VectorSearch { message: err.to_string() })?
				.result;

			Ok(fuse_relative_scores(&dense_points, &lexical_points, alpha, top_k as usize))
		})
	}
}

struct FusedPoint {
	properties: Value,
	score: f32,
}

pub(crate) fn fuse_relative_scores(
	dense: &[ScoredPoint],
	lexical: &[ScoredPoint],
	alpha: f32,
	top_k: usize,
) -> ModalityHits {
	let mut order: Vec<String> = Vec::new();
	let mut fused: HashMap<String, FusedPoint> = HashMap::new();

	for (weight, points) in [(alpha, dense), (1.0 - alpha, lexical)] {
		let normalized = relative_scores(points);

		for (point, score) in points.iter().zip(normalized) {
			let Some(key) = point_key(point) else {
				tracing::warn!("Hybrid search point is missing an id.");

				continue;
			};

			match fused.get_mut(&key) {
				Some(entry) => {
					entry.score += weight * score;
				},
				None => {
					order.push(key.clone());
					fused.insert(
						key,
						FusedPoint { properties: point_properties(point), score: weight * score },
					);
				},
			}
		}
	}

	let mut ranked: Vec<FusedPoint> = order
		.into_iter()
		.filter_map(|key| fused.remove(&key))
		.collect();

	// Stable sort: branch order (dense first) breaks score ties.
	ranked.sort_by(|left, right| cmp_f32_desc(left.score, right.score));
	ranked.truncate(top_k);

	let mut properties = Vec::with_capacity(ranked.len());
	let mut scores = Vec::with_capacity(ranked.len());

	for point in ranked {
		properties.push(point.properties);
		scores.push(Some(point.score));
	}

	ModalityHits::new(properties, scores)
}

/// Min-max normalizes a branch's scores to [0, 1]. A flat branch (one point,
/// or all scores equal) maps to 1.0 everywhere.
fn relative_scores(points: &[ScoredPoint]) -> Vec<f32> {
	let Some(first) = points.first() else {
		return Vec::new();
	};
	let mut min = first.score;
	let mut max = first.score;

	for point in points {
		min = min.min(point.score);
		max = max.max(point.score);
	}

	let span = max - min;

	if span <= f32::EPSILON {
		return vec![1.0; points.len()];
	}

	points.iter().map(|point| (point.score - min) / span).collect()
}

fn point_key(point: &ScoredPoint) -> Option<String> {
	match point.id.as_ref()?.point_id_options.as_ref()? {
		PointIdOptions::Uuid(id) => Some(id.clone()),
		PointIdOptions::Num(num) => Some(num.to_string()),
	}
}

fn point_properties(point: &ScoredPoint) -> Value {
	if point.payload.is_empty() {
		return Value::Null;
	}

	Value::Object(
		point.payload.iter().map(|(key, value)| (key.clone(), kind_to_json(value))).collect(),
	)
}

fn kind_to_json(value: &QdrantValue) -> Value {
	match &value.kind {
		Some(Kind::NullValue(_)) | None => Value::Null,
		Some(Kind::BoolValue(value)) => Value::Bool(*value),
		Some(Kind::IntegerValue(value)) => Value::from(*value),
		Some(Kind::DoubleValue(value)) =>
			serde_json::Number::from_f64(*value).map(Value::Number).unwrap_or(Value::Null),
		Some(Kind::StringValue(value)) => Value::String(value.clone()),
		Some(Kind::ListValue(list)) => Value::Array(list.values.iter().map(kind_to_json).collect()),
		Some(Kind::StructValue(map)) =>
			Value::Object(map.fields.iter().map(|(key, value)| (key.clone(), kind_to_json(value))).collect()),
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
