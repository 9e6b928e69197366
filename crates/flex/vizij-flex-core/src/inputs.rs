//! Input contracts for one actor frame.
//!
//! Hosts gather what the collaborators expose this frame (voices, pose, scene
//! time, blink toggle) and pass it into `engine::run_frame`. Everything here is
//! borrowed read-only for the duration of the call.

use crate::bone_driver::PoseSource;
use crate::phoneme::VoiceSource;

pub struct FrameInputs<'a> {
    /// Absolute time in seconds; drives blink timing and the delay filter.
    pub now: f64,
    /// Frame duration in seconds; the viseme sample window is `[t, t + dt)`.
    pub dt: f32,
    /// Scene time for active choreography events. None skips scene blending.
    pub scene_time: Option<f32>,
    pub voices: Vec<&'a dyn VoiceSource>,
    pub pose: Option<&'a dyn PoseSource>,
    pub blink_toggle: Option<bool>,
}

impl<'a> FrameInputs<'a> {
    pub fn new(now: f64, dt: f32) -> Self {
        Self {
            now,
            dt,
            scene_time: None,
            voices: Vec::new(),
            pose: None,
            blink_toggle: None,
        }
    }

    pub fn with_scene_time(mut self, scene_time: f32) -> Self {
        self.scene_time = Some(scene_time);
        self
    }

    pub fn with_voice(mut self, voice: &'a dyn VoiceSource) -> Self {
        self.voices.push(voice);
        self
    }

    pub fn with_pose(mut self, pose: &'a dyn PoseSource) -> Self {
        self.pose = Some(pose);
        self
    }

    pub fn with_blink_toggle(mut self, toggle: bool) -> Self {
        self.blink_toggle = Some(toggle);
        self
    }
}
