use serde_json::Value;
use tracing::{debug, info};

use super::{
    gltf_utils::{json_array, sampler_end_time},
    types::{ANIMATION_METADATA_KEY, AnimationMetadata, Framerate},
};

/// Scan every sampler's time accessor and derive the clip duration.
///
/// The duration is the largest scalar `max` over all samplers of all
/// animations, or 0 when nothing qualifies. A zero duration is a valid
/// single-pose clip and is reported as such.
pub fn analyze_timing(document: &Value, framerate: Framerate) -> AnimationMetadata {
    let accessors = json_array(document, "accessors")
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut max_duration = 0.0_f64;

    for (anim_index, animation) in json_array(document, "animations")
        .into_iter()
        .flatten()
        .enumerate()
    {
        let name = animation
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        debug!("Processing animation {}: {}", anim_index, name);

        let Some(samplers) = animation.get("samplers").and_then(Value::as_array) else {
            continue;
        };
        for (sampler_index, sampler) in samplers.iter().enumerate() {
            let Some(end_time) = sampler_end_time(accessors, sampler) else {
                continue;
            };
            debug!("  Sampler {}: max time {}s", sampler_index, end_time);
            if end_time > max_duration {
                max_duration = end_time;
            }
        }
    }

    let frame_count = (max_duration * f64::from(framerate.get())).ceil() as u64;
    info!(
        "Calculated max animation duration: {} seconds ({} frames at {} fps)",
        max_duration, frame_count, framerate
    );

    AnimationMetadata {
        max_duration,
        framerate: framerate.get(),
        frame_count,
        computed_at: jiff::Timestamp::now().to_string(),
    }
}

/// Return a copy of `document` whose `extras.animationMetadata` holds the
/// computed timing. Animations and nodes are left untouched.
pub fn annotate_timing(document: &Value, framerate: Framerate) -> Value {
    let metadata = analyze_timing(document, framerate);
    let mut annotated = document.clone();

    if let Some(object) = annotated.as_object_mut() {
        let extras = object
            .entry("extras")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !extras.is_object() {
            *extras = Value::Object(serde_json::Map::new());
        }
        if let (Some(extras), Ok(metadata)) = (extras.as_object_mut(), serde_json::to_value(metadata))
        {
            extras.insert(ANIMATION_METADATA_KEY.to_string(), metadata);
        }
    }

    annotated
}
