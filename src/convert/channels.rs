use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    gltf_utils::{as_index, channel_target_node, channel_target_path},
    types::{HIPS_BONE, HumanoidBoneMap},
};
use crate::error::ConvertError;

/// An animation after channel filtering, with a dense sampler list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredAnimation {
    pub name: String,
    pub channels: Vec<Value>,
    pub samplers: Vec<Value>,
    #[serde(skip)]
    pub removed_channels: usize,
}

/// Why a channel on a humanoid bone was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Scale,
    NonHipsTranslation,
}

/// Decide whether a channel may stay on the given humanoid slot.
///
/// Humanoid bones are never scaled, and only the hips carry translation.
fn check_humanoid_channel(slot: &str, path: Option<&str>) -> Result<(), Rejection> {
    match path {
        Some("scale") => Err(Rejection::Scale),
        Some("translation") if slot != HIPS_BONE => Err(Rejection::NonHipsTranslation),
        _ => Ok(()),
    }
}

/// Drop channels that VRMA forbids on humanoid bones and compact the samplers.
///
/// Channels on nodes outside the bone map (props, face rigs, or node indices
/// past the end of the node list) pass through untouched. Samplers no
/// surviving channel references are dropped, and the rest are renumbered
/// from 0 in their original order.
pub fn filter_animations(
    animations: Option<&Vec<Value>>,
    bones: &HumanoidBoneMap,
) -> Result<Vec<FilteredAnimation>, ConvertError> {
    let Some(animations) = animations else {
        return Ok(Vec::new());
    };
    let node_to_bone = bones.by_node();

    animations
        .iter()
        .enumerate()
        .map(|(index, animation)| filter_animation(index, animation, &node_to_bone))
        .collect()
}

fn filter_animation(
    anim_index: usize,
    animation: &Value,
    node_to_bone: &HashMap<usize, &'static str>,
) -> Result<FilteredAnimation, ConvertError> {
    let channels = animation
        .get("channels")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let samplers = animation
        .get("samplers")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut kept = Vec::<(usize, &Value)>::with_capacity(channels.len());
    for (channel_index, channel) in channels.iter().enumerate() {
        let slot = channel_target_node(channel).and_then(|node| node_to_bone.get(&node));
        if let Some(slot) = slot {
            match check_humanoid_channel(slot, channel_target_path(channel)) {
                Ok(()) => {}
                Err(Rejection::Scale) => {
                    debug!("  Removed scale channel for bone: {}", slot);
                    continue;
                }
                Err(Rejection::NonHipsTranslation) => {
                    debug!("  Removed translation channel for non-hips bone: {}", slot);
                    continue;
                }
            }
        }

        // Only surviving channels need a resolvable sampler.
        let Some(sampler) = as_index(channel.get("sampler")) else {
            return Err(ConvertError::MissingSampler {
                animation: anim_index,
                channel: channel_index,
            });
        };
        if sampler >= samplers.len() {
            return Err(ConvertError::SamplerOutOfRange {
                animation: anim_index,
                channel: channel_index,
                sampler: sampler as u64,
                sampler_count: samplers.len(),
            });
        }

        kept.push((sampler, channel));
    }

    let used_samplers: BTreeSet<usize> = kept.iter().map(|(sampler, _)| *sampler).collect();
    let remap: HashMap<usize, usize> = used_samplers
        .iter()
        .enumerate()
        .map(|(new_index, old_index)| (*old_index, new_index))
        .collect();

    let filtered_samplers = used_samplers
        .iter()
        .map(|old_index| samplers[*old_index].clone())
        .collect();
    let filtered_channels = kept
        .into_iter()
        .map(|(sampler, channel)| {
            let mut channel = channel.clone();
            if let Some(object) = channel.as_object_mut() {
                object.insert("sampler".to_string(), Value::from(remap[&sampler]));
            }
            channel
        })
        .collect::<Vec<Value>>();

    let name = animation
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("VRMAnimation{anim_index}"));

    let removed_channels = channels.len() - filtered_channels.len();
    if removed_channels > 0 {
        info!(
            "  Animation \"{}\": removed {} invalid channel(s)",
            name, removed_channels
        );
    }

    Ok(FilteredAnimation {
        name,
        channels: filtered_channels,
        samplers: filtered_samplers,
        removed_channels,
    })
}
