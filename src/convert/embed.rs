use std::{fs, path::Path};

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use tracing::{info, warn};

use super::gltf_utils::{OCTET_STREAM_BASE64_PREFIX, is_data_uri};

/// Inline external buffer files as base64 data URIs.
///
/// Buffer URIs are resolved against `base_dir`. A referenced file that does
/// not exist is logged and left as-is; buffers that already carry a data URI
/// are untouched.
pub fn embed_buffers(document: &Value, base_dir: &Path) -> Result<Value> {
    let mut embedded = document.clone();
    let Some(buffers) = embedded.get_mut("buffers").and_then(Value::as_array_mut) else {
        info!("No buffers to embed");
        return Ok(embedded);
    };

    for buffer in buffers.iter_mut() {
        let Some(uri) = buffer.get("uri").and_then(Value::as_str) else {
            continue;
        };
        if is_data_uri(uri) {
            continue;
        }

        let buffer_path = base_dir.join(uri);
        if !buffer_path.is_file() {
            warn!("Buffer file not found: {}", uri);
            continue;
        }

        let bytes = fs::read(&buffer_path)
            .with_context(|| format!("failed to read buffer file: {}", buffer_path.display()))?;
        info!("Embedded buffer: {} ({} bytes)", uri, bytes.len());

        let data_uri = format!("{OCTET_STREAM_BASE64_PREFIX}{}", STANDARD.encode(&bytes));
        if let Some(object) = buffer.as_object_mut() {
            object.insert("uri".to_string(), Value::String(data_uri));
        }
    }

    Ok(embedded)
}
