use serde_json::Value;
use tracing::debug;

use super::{
    gltf_utils::json_array,
    types::{HumanoidBoneMap, vrm_bone_for},
};

/// Map Mixamo-named nodes onto VRM humanoid slots.
///
/// Nodes are visited in index order. Names outside the bone table are
/// skipped. When two nodes share a source name the later node wins.
pub fn retarget_bones(document: &Value) -> HumanoidBoneMap {
    let mut bones = HumanoidBoneMap::default();

    for (index, node) in json_array(document, "nodes").into_iter().flatten().enumerate() {
        let Some(name) = node.get("name").and_then(Value::as_str) else {
            continue;
        };
        let Some(slot) = vrm_bone_for(name) else {
            continue;
        };
        if let Some(previous) = bones.node(slot) {
            debug!(
                "Node {} ('{}') replaces node {} for humanoid bone '{}'",
                index, name, previous, slot
            );
        }
        bones.insert(slot, index);
    }

    bones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::types::MIXAMO_TO_VRM_BONES;
    use serde_json::json;

    #[test]
    fn given_mixamo_nodes_when_retargeting_then_vrm_slots_point_at_node_indices() {
        let document = json!({
            "nodes": [
                { "name": "mixamorig:Hips" },
                { "name": "mixamorig:Spine" },
                { "name": "mixamorig:Head" },
                { "name": "mixamorig:LeftHand" },
                { "name": "mixamorig:RightHand" }
            ]
        });

        let bones = retarget_bones(&document);

        assert_eq!(bones.len(), 5);
        assert_eq!(bones.node("hips"), Some(0));
        assert_eq!(bones.node("spine"), Some(1));
        assert_eq!(bones.node("head"), Some(2));
        assert_eq!(bones.node("leftHand"), Some(3));
        assert_eq!(bones.node("rightHand"), Some(4));
    }

    #[test]
    fn given_unknown_and_unnamed_nodes_when_retargeting_then_they_are_skipped() {
        let document = json!({
            "nodes": [
                { "name": "mixamorig:Hips" },
                { "name": "SomeUnknownBone" },
                { "mesh": 0 },
                { "name": "mixamorig:Head" }
            ]
        });

        let bones = retarget_bones(&document);

        assert_eq!(bones.len(), 2);
        assert_eq!(bones.node("hips"), Some(0));
        assert_eq!(bones.node("head"), Some(3));
    }

    #[test]
    fn given_no_nodes_when_retargeting_then_map_is_empty() {
        assert!(retarget_bones(&json!({})).is_empty());
        assert!(retarget_bones(&json!({ "nodes": [] })).is_empty());
    }

    #[test]
    fn given_finger_chain_when_retargeting_then_vrm1_finger_names_are_used() {
        let document = json!({
            "nodes": [
                { "name": "mixamorig:LeftHandThumb1" },
                { "name": "mixamorig:LeftHandThumb2" },
                { "name": "mixamorig:LeftHandThumb3" },
                { "name": "mixamorig:RightHandPinky1" },
                { "name": "mixamorig:RightHandPinky3" }
            ]
        });

        let bones = retarget_bones(&document);

        assert_eq!(bones.node("leftThumbMetacarpal"), Some(0));
        assert_eq!(bones.node("leftThumbProximal"), Some(1));
        assert_eq!(bones.node("leftThumbDistal"), Some(2));
        assert_eq!(bones.node("rightLittleProximal"), Some(3));
        assert_eq!(bones.node("rightLittleDistal"), Some(4));
    }

    #[test]
    fn given_full_mixamo_rig_when_retargeting_then_every_table_entry_is_mapped() {
        let nodes: Vec<Value> = MIXAMO_TO_VRM_BONES
            .iter()
            .map(|(source, _)| json!({ "name": source }))
            .collect();

        let bones = retarget_bones(&json!({ "nodes": nodes }));

        assert_eq!(bones.len(), MIXAMO_TO_VRM_BONES.len());
        for (index, (_, slot)) in MIXAMO_TO_VRM_BONES.iter().enumerate() {
            assert_eq!(bones.node(slot), Some(index));
        }
    }

    #[test]
    fn given_duplicate_source_names_when_retargeting_then_last_node_wins() {
        let document = json!({
            "nodes": [
                { "name": "mixamorig:Hips" },
                { "name": "Armature" },
                { "name": "mixamorig:Hips" }
            ]
        });

        let bones = retarget_bones(&document);

        assert_eq!(bones.len(), 1);
        assert_eq!(bones.node("hips"), Some(2));
    }
}
