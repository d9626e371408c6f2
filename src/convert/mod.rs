mod assemble;
mod channels;
mod embed;
mod gltf_utils;
mod retarget;
mod timing;
mod types;

use serde_json::Value;
use tracing::info;

use crate::error::ConvertError;

// Re-export public types and stages for callers of this module.
pub use assemble::{AssembledContainer, assemble_container, build_vrma_json, take_embedded_buffer};
pub use channels::{FilteredAnimation, filter_animations};
pub use embed::embed_buffers;
pub use retarget::retarget_bones;
pub use timing::{analyze_timing, annotate_timing};
pub use types::{
    AnimationMetadata, ConversionReport, ConvertOptions, Framerate, HIPS_BONE, HumanoidBoneMap,
    MIXAMO_TO_VRM_BONES, VRMA_EXTENSION_NAME, VRMA_SPEC_VERSION, vrm_bone_for,
};

// ─── Public API ───────────────────────────────────────────────────────────────

/// Convert a parsed glTF scene (buffers already inlined) into `.vrma` bytes.
pub fn convert(document: &Value, framerate: Framerate) -> Result<Vec<u8>, ConvertError> {
    convert_with_report(document, framerate).map(|(bytes, _)| bytes)
}

/// Run the full transform and also return a summary of what was produced.
///
/// Stages: timing analysis, bone retargeting, channel filtering, container
/// assembly. Each stage works on its own copy, so the caller's document is
/// never modified.
pub fn convert_with_report(
    document: &Value,
    framerate: Framerate,
) -> Result<(Vec<u8>, ConversionReport), ConvertError> {
    let annotated = annotate_timing(document, framerate);
    let metadata = AnimationMetadata::from_document(&annotated);

    let bones = retarget_bones(&annotated);
    let animations = filter_animations(
        annotated.get("animations").and_then(Value::as_array),
        &bones,
    )?;

    let AssembledContainer { bytes, layout } =
        assemble_container(&annotated, &bones, &animations, metadata.as_ref())?;

    let report = ConversionReport {
        animation_count: animations.len(),
        human_bone_count: bones.len(),
        removed_channel_count: animations
            .iter()
            .map(|animation| animation.removed_channels)
            .sum(),
        duration_sec: metadata.as_ref().map_or(0.0, |meta| meta.max_duration),
        frame_count: metadata.as_ref().map_or(0, |meta| meta.frame_count),
        framerate: framerate.get(),
        json_chunk_bytes: layout.json_chunk_len,
        bin_chunk_bytes: layout.bin_chunk_len.unwrap_or(0),
        total_bytes: layout.total_len,
    };
    info!(
        "Generated VRMA with {} bones and {}s duration",
        report.human_bone_count, report.duration_sec
    );

    Ok((bytes, report))
}
