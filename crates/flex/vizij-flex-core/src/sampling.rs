//! Scalar curve sampling for intensity, emphasis and flex-animation tracks.
//!
//! Model:
//! - A curve holds keys ordered by time (seconds, relative to the owner's start).
//! - Segment [Ki -> K(i+1)] timing is a cubic-bezier determined by:
//!   cp0 = Ki.transitions.out or default {x:0.0, y:0.0}
//!   cp1 = K(i+1).transitions.in or default {x:1.0, y:1.0}
//!   so untouched keys interpolate linearly.
//! - Before the first key and after the last key the edge value is held.
//! - A curve with no keys yields its `default_value`.

use serde::{Deserialize, Serialize};

use crate::interp::functions::{bezier_ease_t, lerp_f32};

const DEFAULT_OUT_X: f32 = 0.0;
const DEFAULT_OUT_Y: f32 = 0.0;
const DEFAULT_IN_X: f32 = 1.0;
const DEFAULT_IN_Y: f32 = 1.0;

/// 2D control point in the normalized segment domain.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Per-key transitions: control points for cubic-bezier timing.
/// `in` shapes the arrival at this key, `out` the departure from it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Transitions {
    #[serde(default)]
    #[serde(rename = "in")]
    pub r#in: Option<Vec2>,
    #[serde(default)]
    #[serde(rename = "out")]
    pub r#out: Option<Vec2>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub transitions: Option<Transitions>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FlexCurve {
    #[serde(default)]
    pub keys: Vec<CurveKey>,
    #[serde(default)]
    pub default_value: f32,
}

impl FlexCurve {
    /// A keyless curve that always samples to `value`.
    pub fn constant(value: f32) -> Self {
        Self {
            keys: Vec::new(),
            default_value: value,
        }
    }

    /// Linear curve through `(time, value)` pairs.
    pub fn linear(points: &[(f32, f32)]) -> Self {
        Self {
            keys: points
                .iter()
                .map(|&(time, value)| CurveKey {
                    time,
                    value,
                    transitions: None,
                })
                .collect(),
            default_value: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the last key, or 0 for a keyless curve.
    pub fn end_time(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or(0.0)
    }

    pub fn sample(&self, t: f32) -> f32 {
        sample_curve(self, t)
    }

    /// Check keys are finite and ordered by time.
    pub fn validate_basic(&self) -> Result<(), String> {
        let mut last = -f32::INFINITY;
        for k in &self.keys {
            if !k.time.is_finite() || !k.value.is_finite() {
                return Err("curve keys must be finite".into());
            }
            if k.time < last {
                return Err("curve key times must be non-decreasing".into());
            }
            last = k.time;
        }
        Ok(())
    }
}

/// Find the segment [i, i+1] that contains t and return (i, i+1, local_t) with
/// local_t normalized to [0, 1] between the two key times.
/// Outside the key range returns (edge, edge, 0).
fn find_segment(keys: &[CurveKey], t: f32) -> (usize, usize, f32) {
    let n = keys.len();
    if n == 1 || t <= keys[0].time {
        return (0, 0, 0.0);
    }
    if t >= keys[n - 1].time {
        return (n - 1, n - 1, 0.0);
    }
    // First key strictly after t; keys are sorted so this is the right edge.
    let right = keys.partition_point(|k| k.time <= t);
    // NaN or unordered key times; hold the first key rather than index out of range
    if right == 0 || right >= n {
        return (0, 0, 0.0);
    }
    let left = right - 1;
    let t0 = keys[left].time;
    let t1 = keys[right].time;
    let denom = (t1 - t0).max(f32::EPSILON);
    (left, right, ((t - t0) / denom).clamp(0.0, 1.0))
}

/// Sample a curve at time `t`.
pub fn sample_curve(curve: &FlexCurve, t: f32) -> f32 {
    let keys = &curve.keys;
    if keys.is_empty() {
        return curve.default_value;
    }
    if !t.is_finite() {
        return keys[0].value;
    }
    let (i0, i1, lt) = find_segment(keys, t);
    if i0 == i1 {
        return keys[i0].value;
    }
    let left = &keys[i0];
    let right = &keys[i1];

    let (x1, y1) = left
        .transitions
        .as_ref()
        .and_then(|t| t.r#out.as_ref())
        .map(|v| (v.x, v.y))
        .unwrap_or((DEFAULT_OUT_X, DEFAULT_OUT_Y));

    let (x2, y2) = right
        .transitions
        .as_ref()
        .and_then(|t| t.r#in.as_ref())
        .map(|v| (v.x, v.y))
        .unwrap_or((DEFAULT_IN_X, DEFAULT_IN_Y));

    let eased = bezier_ease_t(lt, x1, y1, x2, y2);
    lerp_f32(left.value, right.value, eased)
}
