use std::{collections::BTreeMap, collections::HashMap, fmt, num::NonZeroU32, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{decoder::default_decoder_binary_name, error::ConvertError};

// ─── Format constants ─────────────────────────────────────────────────────────

/// Extension name declared by VRM Animation files.
pub const VRMA_EXTENSION_NAME: &str = "VRMC_vrm_animation";

/// Version string written into the VRMA extension block.
pub const VRMA_SPEC_VERSION: &str = "1.0";

/// The only humanoid bone allowed to carry translation channels.
pub const HIPS_BONE: &str = "hips";

/// Key under the source document's `extras` where timing metadata is stored.
pub(super) const ANIMATION_METADATA_KEY: &str = "animationMetadata";

pub(super) const DEFAULT_DURATION_SEC: f64 = 5.0;
pub(super) const DEFAULT_FRAMERATE: u32 = 30;

// ─── Bone name table ──────────────────────────────────────────────────────────

/// Mixamo rig node names mapped to VRM 1.0 humanoid bone slots.
pub const MIXAMO_TO_VRM_BONES: [(&str, &str); 52] = [
    ("mixamorig:Hips", "hips"),
    ("mixamorig:Spine", "spine"),
    ("mixamorig:Spine1", "chest"),
    ("mixamorig:Spine2", "upperChest"),
    ("mixamorig:Neck", "neck"),
    ("mixamorig:Head", "head"),
    ("mixamorig:LeftShoulder", "leftShoulder"),
    ("mixamorig:LeftArm", "leftUpperArm"),
    ("mixamorig:LeftForeArm", "leftLowerArm"),
    ("mixamorig:LeftHand", "leftHand"),
    ("mixamorig:RightShoulder", "rightShoulder"),
    ("mixamorig:RightArm", "rightUpperArm"),
    ("mixamorig:RightForeArm", "rightLowerArm"),
    ("mixamorig:RightHand", "rightHand"),
    ("mixamorig:LeftUpLeg", "leftUpperLeg"),
    ("mixamorig:LeftLeg", "leftLowerLeg"),
    ("mixamorig:LeftFoot", "leftFoot"),
    ("mixamorig:RightUpLeg", "rightUpperLeg"),
    ("mixamorig:RightLeg", "rightLowerLeg"),
    ("mixamorig:RightFoot", "rightFoot"),
    ("mixamorig:LeftToeBase", "leftToes"),
    ("mixamorig:RightToeBase", "rightToes"),
    // ─ left hand ─
    ("mixamorig:LeftHandThumb1", "leftThumbMetacarpal"),
    ("mixamorig:LeftHandThumb2", "leftThumbProximal"),
    ("mixamorig:LeftHandThumb3", "leftThumbDistal"),
    ("mixamorig:LeftHandIndex1", "leftIndexProximal"),
    ("mixamorig:LeftHandIndex2", "leftIndexIntermediate"),
    ("mixamorig:LeftHandIndex3", "leftIndexDistal"),
    ("mixamorig:LeftHandMiddle1", "leftMiddleProximal"),
    ("mixamorig:LeftHandMiddle2", "leftMiddleIntermediate"),
    ("mixamorig:LeftHandMiddle3", "leftMiddleDistal"),
    ("mixamorig:LeftHandRing1", "leftRingProximal"),
    ("mixamorig:LeftHandRing2", "leftRingIntermediate"),
    ("mixamorig:LeftHandRing3", "leftRingDistal"),
    ("mixamorig:LeftHandPinky1", "leftLittleProximal"),
    ("mixamorig:LeftHandPinky2", "leftLittleIntermediate"),
    ("mixamorig:LeftHandPinky3", "leftLittleDistal"),
    // ─ right hand ─
    ("mixamorig:RightHandThumb1", "rightThumbMetacarpal"),
    ("mixamorig:RightHandThumb2", "rightThumbProximal"),
    ("mixamorig:RightHandThumb3", "rightThumbDistal"),
    ("mixamorig:RightHandIndex1", "rightIndexProximal"),
    ("mixamorig:RightHandIndex2", "rightIndexIntermediate"),
    ("mixamorig:RightHandIndex3", "rightIndexDistal"),
    ("mixamorig:RightHandMiddle1", "rightMiddleProximal"),
    ("mixamorig:RightHandMiddle2", "rightMiddleIntermediate"),
    ("mixamorig:RightHandMiddle3", "rightMiddleDistal"),
    ("mixamorig:RightHandRing1", "rightRingProximal"),
    ("mixamorig:RightHandRing2", "rightRingIntermediate"),
    ("mixamorig:RightHandRing3", "rightRingDistal"),
    ("mixamorig:RightHandPinky1", "rightLittleProximal"),
    ("mixamorig:RightHandPinky2", "rightLittleIntermediate"),
    ("mixamorig:RightHandPinky3", "rightLittleDistal"),
];

/// Look up the VRM humanoid slot for a Mixamo node name.
pub fn vrm_bone_for(source_name: &str) -> Option<&'static str> {
    MIXAMO_TO_VRM_BONES
        .iter()
        .find(|(source, _)| *source == source_name)
        .map(|(_, slot)| *slot)
}

// ─── Framerate ────────────────────────────────────────────────────────────────

/// Positive integer sampling rate in frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Framerate(NonZeroU32);

impl Framerate {
    pub fn new(fps: u32) -> Result<Self, ConvertError> {
        NonZeroU32::new(fps)
            .map(Self)
            .ok_or(ConvertError::InvalidFramerate(0))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_FRAMERATE).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<i64> for Framerate {
    type Error = ConvertError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ConvertError::InvalidFramerate(value))
    }
}

impl From<Framerate> for u32 {
    fn from(value: Framerate) -> Self {
        value.get()
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// ─── Humanoid bone map ────────────────────────────────────────────────────────

/// VRM humanoid slot name → source node index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HumanoidBoneMap(BTreeMap<&'static str, usize>);

impl HumanoidBoneMap {
    /// Assign `node` to `slot`, replacing any earlier assignment.
    pub fn insert(&mut self, slot: &'static str, node: usize) {
        self.0.insert(slot, node);
    }

    pub fn node(&self, slot: &str) -> Option<usize> {
        self.0.get(slot).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.0.iter().map(|(slot, node)| (*slot, *node))
    }

    /// Node index → slot name, for channel lookups.
    pub fn by_node(&self) -> HashMap<usize, &'static str> {
        self.iter().map(|(slot, node)| (node, slot)).collect()
    }

    /// JSON payload for `humanoid.humanBones`.
    pub fn to_human_bones_json(&self) -> Value {
        let bones = self
            .iter()
            .map(|(slot, node)| (slot.to_string(), serde_json::json!({ "node": node })))
            .collect::<serde_json::Map<String, Value>>();
        Value::Object(bones)
    }
}

// ─── Timing metadata ──────────────────────────────────────────────────────────

/// Duration data derived from the sampler time accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationMetadata {
    pub max_duration: f64,
    pub framerate: u32,
    pub frame_count: u64,
    pub computed_at: String,
}

impl AnimationMetadata {
    /// Read previously attached metadata from a document's `extras` bag.
    pub fn from_document(document: &Value) -> Option<Self> {
        let metadata = document.get("extras")?.get(ANIMATION_METADATA_KEY)?;
        serde_json::from_value(metadata.clone()).ok()
    }
}

// ─── Options & reports ────────────────────────────────────────────────────────

/// Conversion options shared by the CLI and batch entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Sampling rate used for the frame count.
    pub framerate: Framerate,
    /// Path to the FBX2glTF executable.
    pub decoder_path: PathBuf,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            framerate: Framerate::default(),
            decoder_path: PathBuf::from(".").join(default_decoder_binary_name()),
        }
    }
}

/// Summary returned after a scene has been packed into a VRMA container.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub animation_count: usize,
    pub human_bone_count: usize,
    pub removed_channel_count: usize,
    pub duration_sec: f64,
    pub frame_count: u64,
    pub framerate: u32,
    pub json_chunk_bytes: usize,
    pub bin_chunk_bytes: usize,
    pub total_bytes: usize,
}
