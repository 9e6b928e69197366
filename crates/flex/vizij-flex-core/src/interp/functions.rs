//! Interpolation helpers:
//! - lerp_f32 / remap_clamped (linear maps)
//! - bezier_ease_t (cubic-bezier timing)
//! - exponential_decay (frame-rate independent damping factor)

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Map `v` from `[a, b]` to `[0, 1]`, clamped. A degenerate range acts as a step at `b`.
#[inline]
pub fn remap_clamped(v: f32, a: f32, b: f32) -> f32 {
    let span = b - a;
    if span.abs() <= f32::EPSILON {
        return if v >= b { 1.0 } else { 0.0 };
    }
    ((v - a) / span).clamp(0.0, 1.0)
}

/// Factor by which a quantity shrinks over `dt` seconds when it falls to
/// `decay_to` of itself every `decay_time` seconds.
#[inline]
pub fn exponential_decay(decay_to: f32, decay_time: f32, dt: f32) -> f32 {
    if decay_time <= 0.0 {
        return 0.0;
    }
    (decay_to.ln() / decay_time * dt).exp()
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}
