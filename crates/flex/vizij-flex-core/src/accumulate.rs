//! Blend operations applied to a single controller weight.
//!
//! Every stage writes through `BlendOp::apply` so that the overwrite vs additive
//! choice is explicit at the call site:
//! - visemes accumulate (`Additive`)
//! - expressions and flex-animation tracks cross-fade (`WeightedOverwrite`)
//! - bone drivers and blink replace the value (`Overwrite`)

use serde::{Deserialize, Serialize};

use crate::interp::functions::lerp_f32;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BlendOp {
    /// current + value
    Additive,
    /// current * (1 - amount) + value * amount, amount clamped to [0, 1]
    WeightedOverwrite { amount: f32 },
    /// value
    Overwrite,
}

impl BlendOp {
    #[inline]
    pub fn apply(self, current: f32, value: f32) -> f32 {
        match self {
            BlendOp::Additive => current + value,
            BlendOp::WeightedOverwrite { amount } => {
                lerp_f32(current, value, amount.clamp(0.0, 1.0))
            }
            BlendOp::Overwrite => value,
        }
    }
}

/// Convert a normalized [0,1] weight into a controller's declared range.
///
/// Not clamped and not idempotent: feeding the result back in is a bug.
#[inline]
pub fn denormalize(weight: f32, min: f32, max: f32) -> f32 {
    lerp_f32(min, max, weight)
}

/// Convert a value in `[min, max]` back to a normalized weight.
#[inline]
pub fn normalize(value: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span.abs() <= f32::EPSILON {
        return 0.0;
    }
    (value - min) / span
}
