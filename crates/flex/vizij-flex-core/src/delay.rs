//! Low-pass filtered copy of an actor's final weights.
//!
//! Some consumers want weights that lag slightly behind the instantaneous ones
//! to hide popping. The filter keeps its own buffer and blends toward the
//! current weights with a frame-rate independent exponential decay.

use crate::interp::functions::exponential_decay;

/// Fraction of the old value kept after `DELAY_DECAY_TIME` seconds.
pub const DELAY_DECAY_TO: f32 = 0.8;
pub const DELAY_DECAY_TIME: f32 = 0.033;

#[derive(Clone, Debug, Default)]
pub struct DelayFilter {
    delayed: Vec<f32>,
    last_update: Option<f64>,
}

impl DelayFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blend `weights` into the delayed buffer and return it.
    ///
    /// - The first call (or a change in length) only copies `weights` and
    ///   records `now`.
    /// - Calls at or before the recorded time leave the buffer untouched, so the
    ///   filter runs at most once per frame.
    /// - The elapsed time is clamped to `[0, frame_time]`.
    pub fn update(&mut self, now: f64, frame_time: f32, weights: &[f32]) -> &[f32] {
        let Some(last) = self.last_update.filter(|_| self.delayed.len() == weights.len()) else {
            self.delayed.clear();
            self.delayed.extend_from_slice(weights);
            self.last_update = Some(now);
            return &self.delayed;
        };
        if now <= last {
            return &self.delayed;
        }
        let dt = ((now - last) as f32).clamp(0.0, frame_time.max(0.0));
        let decay = exponential_decay(DELAY_DECAY_TO, DELAY_DECAY_TIME, dt);
        for (d, w) in self.delayed.iter_mut().zip(weights) {
            *d = *d * decay + *w * (1.0 - decay);
        }
        self.last_update = Some(now);
        &self.delayed
    }

    pub fn delayed(&self) -> &[f32] {
        &self.delayed
    }

    pub fn last_update(&self) -> Option<f64> {
        self.last_update
    }

    pub fn reset(&mut self) {
        self.delayed.clear();
        self.last_update = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn first_update_passes_through() {
        let mut f = DelayFilter::new();
        assert_eq!(f.update(1.0, 0.033, &[0.5, 1.0]), &[0.5, 1.0]);
        assert_eq!(f.last_update(), Some(1.0));
    }

    #[test]
    fn one_decay_period_keeps_eighty_percent() {
        let mut f = DelayFilter::new();
        f.update(0.0, 0.033, &[0.0]);
        let out = f.update(0.033, 0.033, &[1.0]);
        approx(out[0], 0.2, 1e-4);
    }

    #[test]
    fn elapsed_time_is_clamped_to_frame_time() {
        let mut f = DelayFilter::new();
        f.update(0.0, 0.033, &[0.0]);
        // a long hitch still only advances one frame's worth
        let out = f.update(5.0, 0.033, &[1.0]);
        approx(out[0], 0.2, 1e-4);
    }

    #[test]
    fn same_timestamp_does_not_run_twice() {
        let mut f = DelayFilter::new();
        f.update(0.0, 0.033, &[0.0]);
        let first = f.update(0.033, 0.033, &[1.0])[0];
        let again = f.update(0.033, 0.033, &[1.0])[0];
        assert_eq!(first, again);
    }

    #[test]
    fn length_change_restarts() {
        let mut f = DelayFilter::new();
        f.update(0.0, 0.033, &[0.0]);
        assert_eq!(f.update(0.033, 0.033, &[0.3, 0.6]), &[0.3, 0.6]);
    }
}
