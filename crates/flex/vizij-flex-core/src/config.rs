//! Core configuration for vizij-flex-core.

use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_CONTROLLER_CAPACITY;

/// Per-actor sizing and optional frame stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial length of each actor's weight buffer. The buffer grows when the
    /// registry hands out a higher index, so this only sizes the first allocation.
    pub controller_capacity: usize,

    /// Seconds a blink lasts once the host flips the blink toggle.
    pub blink_duration: f32,

    /// Produce the low-pass filtered weight array alongside the instantaneous one.
    pub delayed_weights: bool,

    /// Flex-setting files that hold the viseme shapes for each emphasis class.
    pub phoneme_files: PhonemeFiles,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhonemeFiles {
    pub weak: String,
    pub normal: String,
    pub strong: String,
}

impl Default for PhonemeFiles {
    fn default() -> Self {
        Self {
            weak: "phonemes_weak".into(),
            normal: "phonemes".into(),
            strong: "phonemes_strong".into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller_capacity: DEFAULT_CONTROLLER_CAPACITY,
            blink_duration: 0.2,
            delayed_weights: true,
            phoneme_files: PhonemeFiles::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "blink_duration": 0.5 }"#).unwrap();
        assert_eq!(cfg.blink_duration, 0.5);
        assert_eq!(cfg.controller_capacity, DEFAULT_CONTROLLER_CAPACITY);
        assert_eq!(cfg.phoneme_files.normal, "phonemes");
    }
}
