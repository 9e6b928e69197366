//! Per-actor weight buffer and frame lifecycle.
//!
//! The buffer is indexed by global controller index, allocated up front per
//! actor and grown if the registry outgrows it; `begin_frame` clears it for reuse. Values stay normalized while stages
//! blend into it. `denormalize_into` converts them to each controller's range and
//! closes the frame; after that no stage may write until the next `begin_frame`.

use crate::accumulate::{denormalize, BlendOp};
use crate::binding::ModelBinding;
use crate::error::FlexError;
use crate::ids::ControllerId;
use crate::model::ModelDescriptor;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Accumulating,
    Denormalized,
}

#[derive(Debug)]
pub struct WeightBuffer {
    values: Vec<f32>,
    phase: FramePhase,
}

impl WeightBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity],
            phase: FramePhase::Idle,
        }
    }

    #[inline]
    pub fn begin_frame(&mut self) {
        self.values.fill(0.0);
        self.phase = FramePhase::Accumulating;
    }

    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn get(&self, id: ControllerId) -> f32 {
        self.values.get(id.index()).copied().unwrap_or(0.0)
    }

    /// Blend `value` into the controller's slot. Returns false when the frame
    /// is not accumulating.
    ///
    /// The buffer grows to cover any id the registry hands out, so a controller
    /// is only ever dropped when the registry itself refused it.
    #[inline]
    pub fn blend(&mut self, id: ControllerId, value: f32, op: BlendOp) -> bool {
        debug_assert!(
            self.phase == FramePhase::Accumulating,
            "blend into weight buffer while {:?}",
            self.phase
        );
        if self.phase != FramePhase::Accumulating {
            log::error!("dropping flex write to {} outside accumulation", id.0);
            return false;
        }
        let idx = id.index();
        if idx >= self.values.len() {
            log::trace!("growing weight buffer from {} to {}", self.values.len(), idx + 1);
            self.values.resize(idx + 1, 0.0);
        }
        self.values[idx] = op.apply(self.values[idx], value);
        true
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Write the model's controllers, in model-local order, converted to their
    /// declared ranges. Weights are clamped to [0,1] first. May run once per frame.
    pub fn denormalize_into(
        &mut self,
        model: &ModelDescriptor,
        binding: &ModelBinding,
        out: &mut Vec<f32>,
    ) -> Result<(), FlexError> {
        if self.phase == FramePhase::Denormalized {
            return Err(FlexError::AlreadyDenormalized);
        }
        out.clear();
        out.extend(model.controllers.iter().enumerate().map(|(i, c)| {
            let w = binding.global(i).map(|id| self.get(id)).unwrap_or(0.0);
            denormalize(w.clamp(0.0, 1.0), c.min, c.max)
        }));
        self.phase = FramePhase::Denormalized;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ControllerDesc;
    use crate::registry::ControllerRegistry;

    #[test]
    fn begin_frame_clears_previous_values() {
        let mut buf = WeightBuffer::new(4);
        buf.begin_frame();
        assert!(buf.blend(ControllerId(2), 0.5, BlendOp::Overwrite));
        assert_eq!(buf.get(ControllerId(2)), 0.5);
        buf.begin_frame();
        assert_eq!(buf.get(ControllerId(2)), 0.0);
    }

    #[test]
    fn ids_past_the_initial_capacity_grow_the_buffer() {
        let mut buf = WeightBuffer::new(2);
        buf.begin_frame();
        assert!(buf.blend(ControllerId(9), 1.0, BlendOp::Additive));
        assert_eq!(buf.get(ControllerId(9)), 1.0);
        assert_eq!(buf.capacity(), 10);
        buf.begin_frame();
        assert_eq!(buf.get(ControllerId(9)), 0.0);
    }

    #[test]
    fn untouched_slots_read_as_zero() {
        let buf = WeightBuffer::new(2);
        assert_eq!(buf.get(ControllerId(40)), 0.0);
    }

    fn mk_closed_frame() -> WeightBuffer {
        let reg = ControllerRegistry::with_capacity(4);
        let model = ModelDescriptor::new("m", vec![ControllerDesc::new("a", 0.0, 1.0)]);
        let binding = ModelBinding::build(&model, &reg);
        let mut buf = WeightBuffer::new(4);
        buf.begin_frame();
        buf.blend(ControllerId(0), 0.5, BlendOp::Overwrite);
        let mut out = Vec::new();
        buf.denormalize_into(&model, &binding, &mut out).unwrap();
        buf
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn blend_after_denormalize_is_dropped() {
        let mut buf = mk_closed_frame();
        assert!(!buf.blend(ControllerId(0), 1.0, BlendOp::Overwrite));
        assert_eq!(buf.get(ControllerId(0)), 0.5);
        assert_eq!(buf.phase(), FramePhase::Denormalized);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "blend into weight buffer while Denormalized")]
    fn blend_after_denormalize_asserts_in_debug() {
        let mut buf = mk_closed_frame();
        buf.blend(ControllerId(0), 1.0, BlendOp::Overwrite);
    }

    #[test]
    fn second_denormalize_in_a_frame_is_refused() {
        let reg = ControllerRegistry::with_capacity(4);
        let model = ModelDescriptor::new("m", vec![ControllerDesc::new("a", -1.0, 1.0)]);
        let binding = ModelBinding::build(&model, &reg);
        let mut buf = WeightBuffer::new(4);
        buf.begin_frame();
        buf.blend(ControllerId(0), 2.0, BlendOp::Additive);
        let mut out = Vec::new();
        buf.denormalize_into(&model, &binding, &mut out).unwrap();
        // accumulated 2.0 is clamped to 1.0 before mapping
        assert_eq!(out, vec![1.0]);
        assert_eq!(
            buf.denormalize_into(&model, &binding, &mut out),
            Err(FlexError::AlreadyDenormalized)
        );
        buf.begin_frame();
        assert!(buf.denormalize_into(&model, &binding, &mut out).is_ok());
    }
}
