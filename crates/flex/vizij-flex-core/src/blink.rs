//! Blink driven by a host toggle.
//!
//! The authoritative side flips a boolean whenever the character should blink.
//! Each flip starts a blink that closes and reopens the eyes over the configured
//! duration, written to the global "blink" controller.

use std::f32::consts::PI;

use crate::accumulate::BlendOp;
use crate::ids::ControllerId;
use crate::registry::ControllerRegistry;
use crate::scratch::WeightBuffer;

pub const BLINK_CONTROLLER: &str = "blink";

#[derive(Clone, Debug, Default)]
pub struct BlinkState {
    last_toggle: Option<bool>,
    blink_end: Option<f64>,
    controller: Option<ControllerId>,
}

impl BlinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the host toggle; a change starts a new blink ending at `now + duration`.
    pub fn observe(&mut self, toggle: bool, now: f64, duration: f32) {
        match self.last_toggle {
            Some(prev) if prev != toggle => {
                self.blink_end = Some(now + duration as f64);
            }
            _ => {}
        }
        self.last_toggle = Some(toggle);
    }

    /// Blink weight at `now`: `sin(pi * progress)` while a blink is running, else None.
    pub fn weight_at(&self, now: f64, duration: f32) -> Option<f32> {
        let end = self.blink_end?;
        let remaining = (end - now) as f32;
        if duration <= 0.0 || remaining <= 0.0 || remaining > duration {
            return None;
        }
        let progress = 1.0 - remaining / duration;
        Some((PI * progress).sin().max(0.0))
    }

    /// Overwrite the blink controller if a blink is in progress.
    pub fn apply(
        &mut self,
        now: f64,
        duration: f32,
        registry: &ControllerRegistry,
        weights: &mut WeightBuffer,
    ) -> bool {
        let Some(w) = self.weight_at(now, duration) else {
            return false;
        };
        if self.controller.is_none() {
            self.controller = registry.get_or_create(BLINK_CONTROLLER).ok();
        }
        match self.controller {
            Some(id) => weights.blend(id, w, BlendOp::Overwrite),
            None => false,
        }
    }
}
