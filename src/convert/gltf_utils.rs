use serde_json::Value;

// ─── Tolerant JSON accessors ──────────────────────────────────────────────────

/// Borrow a top-level array of the scene document, treating anything else as absent.
pub(super) fn json_array<'a>(json: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    json.get(key).and_then(Value::as_array)
}

pub(super) fn as_index(value: Option<&Value>) -> Option<usize> {
    value.and_then(Value::as_u64).map(|index| index as usize)
}

/// Target node index of an animation channel.
pub(super) fn channel_target_node(channel: &Value) -> Option<usize> {
    as_index(channel.get("target").and_then(|target| target.get("node")))
}

/// Target property path of an animation channel.
pub(super) fn channel_target_path(channel: &Value) -> Option<&str> {
    channel
        .get("target")
        .and_then(|target| target.get("path"))
        .and_then(Value::as_str)
}

/// End time of a sampler's input accessor when it is a scalar time axis with a
/// recorded maximum.
pub(super) fn sampler_end_time(accessors: &[Value], sampler: &Value) -> Option<f64> {
    let accessor = accessors.get(as_index(sampler.get("input"))?)?;
    if accessor.get("type").and_then(Value::as_str) != Some("SCALAR") {
        return None;
    }
    accessor
        .get("max")
        .and_then(Value::as_array)
        .and_then(|max| max.first())
        .and_then(Value::as_f64)
}

// ─── Data URIs ────────────────────────────────────────────────────────────────

pub(super) const DATA_URI_PREFIX: &str = "data:";
pub(super) const OCTET_STREAM_BASE64_PREFIX: &str = "data:application/octet-stream;base64,";

pub(super) fn is_data_uri(uri: &str) -> bool {
    uri.starts_with(DATA_URI_PREFIX)
}

/// Base64 payload that follows the first comma of a data URI.
pub(super) fn data_uri_payload(uri: &str) -> Option<&str> {
    uri.split_once(',').map(|(_, payload)| payload)
}
