//! Output contracts from one actor frame.
//!
//! Weights are in the model's own controller order and already converted to
//! each controller's declared range.

use serde::{Deserialize, Serialize};

/// Counts of what contributed this frame, for tests and tooling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub visemes: usize,
    pub scene_events: usize,
    pub bone_drivers: usize,
    pub blink: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameOutput {
    pub weights: Vec<f32>,
    /// Low-pass filtered weights, when `Config::delayed_weights` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delayed: Option<Vec<f32>>,
    #[serde(default)]
    pub stats: FrameStats,
}

impl FrameOutput {
    /// Weight of the model-local controller `local`.
    #[inline]
    pub fn weight(&self, local: usize) -> Option<f32> {
        self.weights.get(local).copied()
    }
}
