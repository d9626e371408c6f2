use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::{Map, Value, json};
use tracing::info;

use super::{
    channels::FilteredAnimation,
    gltf_utils::{data_uri_payload, is_data_uri},
    types::{
        AnimationMetadata, DEFAULT_DURATION_SEC, DEFAULT_FRAMERATE, HumanoidBoneMap,
        VRMA_EXTENSION_NAME, VRMA_SPEC_VERSION,
    },
};
use crate::{
    container::{ContainerLayout, pack_container},
    error::ConvertError,
};

/// Node properties that have no meaning in a VRMA rest pose.
const STRIPPED_NODE_KEYS: [&str; 3] = ["mesh", "skin", "scale"];

/// Top-level properties copied verbatim from the source scene.
const PASSTHROUGH_KEYS: [&str; 3] = ["asset", "scene", "scenes"];
const BUFFER_KEYS: [&str; 3] = ["accessors", "bufferViews", "buffers"];

/// Standard alphabet decoder that accepts payloads with or without `=` padding.
const DATA_URI_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Packed `.vrma` bytes and the chunk sizes they were laid out with.
#[derive(Debug, Clone)]
pub struct AssembledContainer {
    pub bytes: Vec<u8>,
    pub layout: ContainerLayout,
}

/// Build the VRMA JSON document.
///
/// Geometry is dropped: nodes lose `mesh`, `skin`, and `scale`, and meshes,
/// skins, materials, textures, and images are not carried over. Timing lives
/// in the top-level `extras` because the VRMA extension has no slot for it.
pub fn build_vrma_json(
    document: &Value,
    bones: &HumanoidBoneMap,
    animations: &[FilteredAnimation],
    metadata: Option<&AnimationMetadata>,
) -> Result<Value, ConvertError> {
    let mut vrma = Map::new();

    for key in PASSTHROUGH_KEYS {
        if let Some(value) = document.get(key) {
            vrma.insert(key.to_string(), value.clone());
        }
    }

    if let Some(nodes) = document.get("nodes").and_then(Value::as_array) {
        let nodes = nodes.iter().map(strip_node).collect::<Vec<Value>>();
        vrma.insert("nodes".to_string(), Value::Array(nodes));
    }

    vrma.insert("animations".to_string(), serde_json::to_value(animations)?);

    for key in BUFFER_KEYS {
        if let Some(value) = document.get(key) {
            vrma.insert(key.to_string(), value.clone());
        }
    }

    vrma.insert("extensionsUsed".to_string(), json!([VRMA_EXTENSION_NAME]));
    vrma.insert(
        "extensions".to_string(),
        json!({
            VRMA_EXTENSION_NAME: {
                "specVersion": VRMA_SPEC_VERSION,
                "humanoid": {
                    "humanBones": bones.to_human_bones_json()
                }
            }
        }),
    );

    let (duration, frame_count, framerate) = match metadata {
        Some(metadata) => (
            metadata.max_duration,
            metadata.frame_count,
            metadata.framerate,
        ),
        None => (DEFAULT_DURATION_SEC, 0, DEFAULT_FRAMERATE),
    };
    vrma.insert(
        "extras".to_string(),
        json!({
            "duration": duration,
            "frameCount": frame_count,
            "framerate": framerate
        }),
    );

    Ok(Value::Object(vrma))
}

fn strip_node(node: &Value) -> Value {
    let mut node = node.clone();
    if let Some(object) = node.as_object_mut() {
        object.retain(|key, _| !STRIPPED_NODE_KEYS.contains(&key.as_str()));
    }
    node
}

/// Move the first buffer's inline base64 payload out of the JSON.
///
/// Returns the decoded bytes, or `None` when the first buffer has no data URI
/// or the payload is empty. The `uri` property is removed either way once a
/// data URI was found, since GLB buffers reference the BIN chunk implicitly.
pub fn take_embedded_buffer(vrma: &mut Value) -> Result<Option<Vec<u8>>, ConvertError> {
    let Some(buffer) = vrma
        .get_mut("buffers")
        .and_then(Value::as_array_mut)
        .and_then(|buffers| buffers.first_mut())
        .and_then(Value::as_object_mut)
    else {
        return Ok(None);
    };
    let Some(uri) = buffer.get("uri").and_then(Value::as_str) else {
        return Ok(None);
    };
    if !is_data_uri(uri) {
        return Ok(None);
    }

    let payload = data_uri_payload(uri).ok_or_else(|| ConvertError::InvalidDataUri {
        buffer: 0,
        reason: "missing ',' separator".to_string(),
    })?;
    let bytes = DATA_URI_ENGINE
        .decode(payload)
        .map_err(|err| ConvertError::InvalidDataUri {
            buffer: 0,
            reason: err.to_string(),
        })?;

    buffer.retain(|key, _| key != "uri");

    Ok((!bytes.is_empty()).then_some(bytes))
}

/// Build, serialize, and pack the VRMA document into GLB bytes.
pub fn assemble_container(
    document: &Value,
    bones: &HumanoidBoneMap,
    animations: &[FilteredAnimation],
    metadata: Option<&AnimationMetadata>,
) -> Result<AssembledContainer, ConvertError> {
    let mut vrma = build_vrma_json(document, bones, animations, metadata)?;
    let bin = take_embedded_buffer(&mut vrma)?;
    let json_bytes = serde_json::to_vec(&vrma)?;

    let layout = ContainerLayout::new(json_bytes.len(), bin.as_ref().map(Vec::len));
    let bytes = pack_container(&json_bytes, bin.as_deref())?;
    info!(
        "Packed VRMA: {} bytes (JSON: {}, BIN: {})",
        layout.total_len,
        layout.json_chunk_len,
        layout.bin_chunk_len.unwrap_or(0)
    );

    Ok(AssembledContainer { bytes, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::unpack_container;

    fn metadata(max_duration: f64, framerate: u32, frame_count: u64) -> AnimationMetadata {
        AnimationMetadata {
            max_duration,
            framerate,
            frame_count,
            computed_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn hips_only() -> HumanoidBoneMap {
        let mut bones = HumanoidBoneMap::default();
        bones.insert("hips", 0);
        bones
    }

    #[test]
    fn given_scene_when_building_json_then_vrma_structure_is_produced() {
        let document = json!({
            "asset": { "version": "2.0", "generator": "test" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "mixamorig:Hips" }],
            "meshes": [{ "primitives": [] }],
            "skins": [{ "joints": [0] }],
            "materials": [{}],
            "accessors": [],
            "bufferViews": [],
            "buffers": []
        });
        let animations = vec![FilteredAnimation {
            name: "Idle".to_string(),
            channels: vec![],
            samplers: vec![],
            removed_channels: 0,
        }];

        let vrma = build_vrma_json(
            &document,
            &hips_only(),
            &animations,
            Some(&metadata(2.0, 30, 60)),
        )
        .expect("build VRMA JSON");

        assert_eq!(vrma["extensionsUsed"], json!(["VRMC_vrm_animation"]));
        let extension = &vrma["extensions"]["VRMC_vrm_animation"];
        assert_eq!(extension["specVersion"], "1.0");
        assert_eq!(
            extension["humanoid"]["humanBones"],
            json!({ "hips": { "node": 0 } })
        );
        assert!(extension.get("meta").is_none());
        assert_eq!(vrma["extras"], json!({ "duration": 2.0, "frameCount": 60, "framerate": 30 }));
        for geometry in ["meshes", "skins", "materials", "textures", "images"] {
            assert!(vrma.get(geometry).is_none(), "{geometry} should be dropped");
        }
        assert_eq!(vrma["scene"], 0);
        assert_eq!(vrma["scenes"], document["scenes"]);
        assert_eq!(
            vrma["animations"],
            json!([{ "name": "Idle", "channels": [], "samplers": [] }])
        );
    }

    #[test]
    fn given_nodes_with_geometry_when_building_json_then_mesh_skin_and_scale_are_stripped() {
        let document = json!({
            "asset": { "version": "2.0" },
            "nodes": [
                { "name": "mixamorig:Hips", "mesh": 0, "skin": 0, "scale": [1, 1, 1] },
                { "name": "mixamorig:Spine", "translation": [0, 1, 0], "rotation": [0, 0, 0, 1] },
                { "name": "Body", "mesh": 1, "children": [0] }
            ]
        });

        let vrma = build_vrma_json(&document, &hips_only(), &[], None).expect("build VRMA JSON");

        assert_eq!(vrma["nodes"][0], json!({ "name": "mixamorig:Hips" }));
        assert_eq!(
            vrma["nodes"][1],
            json!({ "name": "mixamorig:Spine", "translation": [0, 1, 0], "rotation": [0, 0, 0, 1] })
        );
        assert_eq!(vrma["nodes"][2], json!({ "name": "Body", "children": [0] }));
    }

    #[test]
    fn given_no_metadata_when_building_json_then_default_timing_is_used() {
        let vrma = build_vrma_json(&json!({ "nodes": [] }), &HumanoidBoneMap::default(), &[], None)
            .expect("build VRMA JSON");

        assert_eq!(vrma["extras"]["duration"], 5.0);
        assert_eq!(vrma["extras"]["framerate"], 30);
        assert_eq!(vrma["extras"]["frameCount"], 0);
        assert_eq!(vrma["animations"], json!([]));
        assert!(vrma.get("asset").is_none());
    }

    #[test]
    fn given_data_uri_buffer_when_taking_payload_then_bytes_are_decoded_and_uri_removed() {
        let mut vrma = json!({
            "buffers": [{ "byteLength": 4, "uri": "data:application/octet-stream;base64,AQIDBA==" }]
        });

        let bin = take_embedded_buffer(&mut vrma).expect("take buffer");

        assert_eq!(bin, Some(vec![1, 2, 3, 4]));
        assert_eq!(vrma["buffers"][0], json!({ "byteLength": 4 }));
    }

    #[test]
    fn given_unpadded_data_uri_when_taking_payload_then_bytes_are_decoded() {
        let mut vrma = json!({
            "buffers": [{ "byteLength": 4, "uri": "data:application/octet-stream;base64,AQIDBA" }]
        });

        let bin = take_embedded_buffer(&mut vrma).expect("take buffer");

        assert_eq!(bin, Some(vec![1, 2, 3, 4]));
        assert_eq!(vrma["buffers"][0], json!({ "byteLength": 4 }));
    }

    #[test]
    fn given_empty_data_uri_payload_when_taking_payload_then_uri_is_removed_without_bytes() {
        let mut vrma = json!({
            "buffers": [{ "byteLength": 0, "uri": "data:application/octet-stream;base64," }]
        });

        let bin = take_embedded_buffer(&mut vrma).expect("take buffer");

        assert_eq!(bin, None);
        assert_eq!(vrma["buffers"][0], json!({ "byteLength": 0 }));
    }

    #[test]
    fn given_empty_data_uri_payload_when_assembling_then_no_bin_chunk_is_emitted() {
        let document = json!({
            "asset": { "version": "2.0" },
            "buffers": [{ "byteLength": 0, "uri": "data:application/octet-stream;base64," }]
        });

        let assembled =
            assemble_container(&document, &HumanoidBoneMap::default(), &[], None).expect("assemble");
        let unpacked = unpack_container(&assembled.bytes).expect("unpack");

        assert_eq!(assembled.layout.bin_chunk_len, None);
        assert!(unpacked.bin.is_none());
        let json = unpacked.json_value().expect("parse JSON chunk");
        assert!(json["buffers"][0].get("uri").is_none());
    }

    #[test]
    fn given_external_uri_or_no_buffers_when_taking_payload_then_nothing_is_extracted() {
        let mut external = json!({ "buffers": [{ "uri": "anim.bin" }] });
        assert_eq!(take_embedded_buffer(&mut external).expect("take"), None);
        assert_eq!(external["buffers"][0]["uri"], "anim.bin");

        let mut empty = json!({ "buffers": [] });
        assert_eq!(take_embedded_buffer(&mut empty).expect("take"), None);

        let mut absent = json!({});
        assert_eq!(take_embedded_buffer(&mut absent).expect("take"), None);
    }

    #[test]
    fn given_corrupt_base64_when_taking_payload_then_error_is_returned() {
        let mut vrma = json!({
            "buffers": [{ "uri": "data:application/octet-stream;base64,@@@" }]
        });

        assert!(matches!(
            take_embedded_buffer(&mut vrma),
            Err(ConvertError::InvalidDataUri { buffer: 0, .. })
        ));
    }

    #[test]
    fn given_embedded_buffer_when_assembling_then_bin_chunk_holds_the_payload() {
        let document = json!({
            "asset": { "version": "2.0" },
            "nodes": [],
            "buffers": [{ "byteLength": 4, "uri": "data:application/octet-stream;base64,AQIDBA==" }],
            "extensionsUsed": ["VRMC_vrm_animation"]
        });

        let assembled =
            assemble_container(&document, &HumanoidBoneMap::default(), &[], None).expect("assemble");
        let unpacked = unpack_container(&assembled.bytes).expect("unpack");

        assert_eq!(assembled.bytes.len(), assembled.layout.total_len);
        assert_eq!(assembled.layout.bin_chunk_len, Some(4));
        assert_eq!(unpacked.bin, Some(vec![1, 2, 3, 4]));
        let json = unpacked.json_value().expect("parse JSON chunk");
        assert!(json["buffers"][0].get("uri").is_none());
        assert_eq!(json["buffers"][0]["byteLength"], 4);
    }
}
