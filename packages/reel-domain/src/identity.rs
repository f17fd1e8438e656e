use serde_json::Value;

/// Property keys probed for an identity, in priority order.
pub const IDENTITY_KEYS: [&str; 3] = ["frame_id", "id", "keyframe_id"];

/// Derives the identity key used to recognize the same keyframe across
/// independent result sets.
///
/// Objects are probed for [`IDENTITY_KEYS`] in order; a non-empty array
/// contributes its first element. Anything else has no identity.
pub fn extract_identity(properties: &Value) -> Option<String> {
	match properties {
		Value::Object(map) =>
			IDENTITY_KEYS.iter().find_map(|key| map.get(*key)).map(render_identity),
		Value::Array(items) => items.first().map(render_identity),
		_ => None,
	}
}

fn render_identity(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}
