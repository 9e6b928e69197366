//! Bone-driven controllers.
//!
//! Runs after the skeletal pose is resolved and after every other stage: each
//! rule reads one component of a bone's local position, remaps `[min, max]` to
//! `[0, 1]` and overwrites the target controller.

use crate::accumulate::BlendOp;
use crate::binding::ModelBinding;
use crate::interp::functions::remap_clamped;
use crate::model::ModelDescriptor;
use crate::scratch::WeightBuffer;

/// Resolved local-space bone positions, supplied by the skeleton collaborator.
pub trait PoseSource {
    fn bone_local_position(&self, bone: usize) -> Option<[f32; 3]>;
}

impl PoseSource for [[f32; 3]] {
    fn bone_local_position(&self, bone: usize) -> Option<[f32; 3]> {
        self.get(bone).copied()
    }
}

impl PoseSource for Vec<[f32; 3]> {
    fn bone_local_position(&self, bone: usize) -> Option<[f32; 3]> {
        self.as_slice().bone_local_position(bone)
    }
}

/// Apply the model's bone-flex rules. Returns how many rules wrote a value.
pub fn drive_from_bones(
    model: &ModelDescriptor,
    binding: &ModelBinding,
    weights: &mut WeightBuffer,
    pose: &dyn PoseSource,
) -> usize {
    let mut applied = 0;
    for rule in &model.bone_flex_drivers {
        let Some(pos) = pose.bone_local_position(rule.bone_index) else {
            log::trace!("bone {} has no pose; driver skipped", rule.bone_index);
            continue;
        };
        let Some(id) = binding.global(rule.controller_index) else {
            continue;
        };
        let value = remap_clamped(rule.axis.component(pos), rule.min, rule.max);
        if weights.blend(id, value, BlendOp::Overwrite) {
            applied += 1;
        }
    }
    applied
}
