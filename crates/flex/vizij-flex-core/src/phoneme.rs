//! Viseme blending from voice phoneme timelines.
//!
//! Each active voice exposes a sentence of timed phoneme tags and an emphasis
//! curve. Every frame the phonemes overlapping the sample window `[t, t + dt)`
//! add their viseme shapes to the weight buffer, scaled by how much of the window
//! they cover (box filter) and cross-faded between three emphasis classes:
//! Weak, Normal and Strong. Normal is required; Weak and Strong are optional.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::accumulate::BlendOp;
use crate::binding::TranslationCache;
use crate::config::PhonemeFiles;
use crate::data::FlexSettingFile;
use crate::engine::BlendContext;
use crate::library::FlexSettingLibrary;
use crate::sampling::FlexCurve;
use crate::scratch::WeightBuffer;

/// Above this emphasis the Strong class fades in.
pub const STRONG_CROSSFADE_START: f32 = 0.60;
/// Below this emphasis the Weak class fades in.
pub const WEAK_CROSSFADE_START: f32 = 0.40;

/// Emphasis used by sentences without an authored emphasis curve.
pub const DEFAULT_EMPHASIS: f32 = 0.5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmphasisClass {
    Weak,
    Normal,
    Strong,
}

impl EmphasisClass {
    pub const ALL: [EmphasisClass; 3] = [
        EmphasisClass::Weak,
        EmphasisClass::Normal,
        EmphasisClass::Strong,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            EmphasisClass::Weak => 0,
            EmphasisClass::Normal => 1,
            EmphasisClass::Strong => 2,
        }
    }

    pub fn file_name(self, files: &PhonemeFiles) -> &str {
        match self {
            EmphasisClass::Weak => &files.weak,
            EmphasisClass::Normal => &files.normal,
            EmphasisClass::Strong => &files.strong,
        }
    }
}

/// A phoneme spoken over `[start_time, end_time)` seconds of its sentence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhonemeTag {
    pub code: String,
    pub start_time: f32,
    pub end_time: f32,
}

impl PhonemeTag {
    pub fn new(code: &str, start_time: f32, end_time: f32) -> Self {
        Self {
            code: code.to_string(),
            start_time,
            end_time,
        }
    }
}

/// Read-only view of a playing voice, supplied by the audio collaborator.
pub trait VoiceSource {
    fn phonemes(&self) -> &[PhonemeTag];
    /// Emphasis in [0,1] at sentence time `t`.
    fn intensity(&self, t: f32, duration: f32) -> f32;
    /// Playback position in seconds.
    fn elapsed(&self) -> f32;
    fn duration(&self) -> f32;
}

/// A sentence with its phonemes and emphasis curve, played back from `elapsed`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SentenceVoice {
    pub phonemes: Vec<PhonemeTag>,
    pub emphasis: FlexCurve,
    pub duration: f32,
    #[serde(default)]
    pub elapsed: f32,
}

impl SentenceVoice {
    pub fn new(phonemes: Vec<PhonemeTag>, duration: f32) -> Self {
        Self {
            phonemes,
            emphasis: FlexCurve::constant(DEFAULT_EMPHASIS),
            duration,
            elapsed: 0.0,
        }
    }

    /// Replace the emphasis curve. A malformed curve is ignored and the
    /// current one kept.
    pub fn with_emphasis(mut self, emphasis: FlexCurve) -> Self {
        match emphasis.validate_basic() {
            Ok(()) => self.emphasis = emphasis,
            Err(e) => log::debug!("emphasis curve ignored: {}", e),
        }
        self
    }
}

impl VoiceSource for SentenceVoice {
    fn phonemes(&self) -> &[PhonemeTag] {
        &self.phonemes
    }

    fn intensity(&self, t: f32, duration: f32) -> f32 {
        self.emphasis.sample(t.clamp(0.0, duration.max(0.0))).clamp(0.0, 1.0)
    }

    fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn duration(&self) -> f32 {
        self.duration
    }
}

#[derive(Clone, Debug)]
pub struct PhonemeClass {
    pub class: EmphasisClass,
    /// Whether the class's setting file was found; cached after the first lookup.
    pub valid: bool,
    /// Cross-fade amount from the most recent evaluation.
    pub amount: f32,
    file: Option<Arc<FlexSettingFile>>,
}

impl PhonemeClass {
    fn new(class: EmphasisClass) -> Self {
        Self {
            class,
            valid: false,
            amount: 0.0,
            file: None,
        }
    }

    pub fn file(&self) -> Option<&Arc<FlexSettingFile>> {
        self.file.as_ref()
    }
}

/// Per-actor emphasis class table.
#[derive(Clone, Debug)]
pub struct PhonemeClasses {
    classes: [PhonemeClass; 3],
    resolved: bool,
    /// Phoneme code -> setting index in each class file, indexed by `EmphasisClass::index`.
    codes: HashMap<String, [Option<usize>; 3]>,
}

impl Default for PhonemeClasses {
    fn default() -> Self {
        Self::new()
    }
}

impl PhonemeClasses {
    pub fn new() -> Self {
        Self {
            classes: EmphasisClass::ALL.map(PhonemeClass::new),
            resolved: false,
            codes: HashMap::new(),
        }
    }

    /// Look up each class's setting file once. A missing file is a permanent
    /// state for this actor, not an error.
    pub fn resolve(&mut self, library: &FlexSettingLibrary, files: &PhonemeFiles) {
        if self.resolved {
            return;
        }
        for pc in &mut self.classes {
            let name = pc.class.file_name(files);
            pc.file = library.get(name);
            pc.valid = pc.file.is_some();
            if !pc.valid {
                if pc.class == EmphasisClass::Normal {
                    log::debug!("phoneme file '{}' missing; visemes disabled", name);
                } else {
                    log::trace!("optional phoneme file '{}' missing", name);
                }
            }
        }
        self.resolved = true;
    }

    /// Forget cached lookups so the next evaluation searches the library again.
    pub fn invalidate(&mut self) {
        *self = Self::new();
    }

    pub fn class(&self, class: EmphasisClass) -> &PhonemeClass {
        &self.classes[class.index()]
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Setting index of `code` in each class file. Looked up once per code and
    /// cached until `invalidate`.
    pub fn settings_for(&mut self, code: &str) -> [Option<usize>; 3] {
        if let Some(found) = self.codes.get(code) {
            return *found;
        }
        let found = EmphasisClass::ALL.map(|c| {
            self.classes[c.index()]
                .file
                .as_ref()
                .and_then(|f| f.find_setting_index(code))
        });
        self.codes.insert(code.to_string(), found);
        found
    }
}

/// Split an emphasis intensity across the three classes.
///
/// Returns amounts indexed by `EmphasisClass::index`. The Normal amount is
/// continuous at both pivots.
pub fn crossfade_amounts(intensity: f32, has_weak: bool, has_strong: bool) -> [f32; 3] {
    let intensity = intensity.clamp(0.0, 1.0);
    let mut amounts = [0.0f32; 3];
    let normal = EmphasisClass::Normal.index();
    if intensity > STRONG_CROSSFADE_START {
        if has_strong {
            let frac = (1.0 - intensity) / (1.0 - STRONG_CROSSFADE_START);
            amounts[normal] = frac * 2.0 * STRONG_CROSSFADE_START;
            amounts[EmphasisClass::Strong.index()] = 1.0 - frac;
        } else {
            amounts[normal] = 2.0 * intensity.min(STRONG_CROSSFADE_START);
        }
    } else if intensity < WEAK_CROSSFADE_START {
        if has_weak {
            let frac = (WEAK_CROSSFADE_START - intensity) / WEAK_CROSSFADE_START;
            amounts[normal] = (1.0 - frac) * 2.0 * WEAK_CROSSFADE_START;
            amounts[EmphasisClass::Weak.index()] = frac;
        } else {
            amounts[normal] = 2.0 * intensity.max(WEAK_CROSSFADE_START);
        }
    } else {
        amounts[normal] = 2.0 * intensity;
    }
    amounts
}

/// Fraction of the sample window `[t, t + dt)` covered by `[start, end)`, or
/// None when they do not overlap.
#[inline]
pub fn window_overlap(start: f32, end: f32, t: f32, dt: f32) -> Option<f32> {
    if dt <= 0.0 {
        return None;
    }
    let t1 = (start - t) / dt;
    let t2 = (end - t) / dt;
    if t1 >= 1.0 || t2 <= 0.0 {
        return None;
    }
    let scale = t2.min(1.0) - t1.max(0.0);
    (scale > 0.0).then_some(scale)
}

/// Add viseme contributions for every phoneme visible in this frame's window.
///
/// Returns how many phonemes contributed. Unmapped phoneme codes are skipped.
pub fn blend_visemes(
    classes: &mut PhonemeClasses,
    translations: &mut TranslationCache,
    weights: &mut WeightBuffer,
    voices: &[&dyn VoiceSource],
    dt: f32,
    ctx: &BlendContext,
) -> usize {
    if voices.is_empty() || dt <= 0.0 {
        return 0;
    }
    classes.resolve(ctx.library, &ctx.config.phoneme_files);
    let files: [Option<Arc<FlexSettingFile>>; 3] =
        EmphasisClass::ALL.map(|c| classes.class(c).file.clone());
    if files[EmphasisClass::Normal.index()].is_none() {
        return 0;
    }

    let mut contributed = 0;
    for voice in voices {
        let t = voice.elapsed();
        let intensity = voice.intensity(t, voice.duration());

        for tag in voice.phonemes() {
            let Some(scale) = window_overlap(tag.start_time, tag.end_time, t, dt) else {
                continue;
            };

            let found = classes.settings_for(&tag.code);
            let settings: [Option<(&Arc<FlexSettingFile>, usize)>; 3] =
                EmphasisClass::ALL.map(|c| files[c.index()].as_ref().zip(found[c.index()]));
            if settings[EmphasisClass::Normal.index()].is_none() {
                log::trace!("no viseme for phoneme '{}'", tag.code);
                continue;
            }

            let amounts = crossfade_amounts(
                intensity,
                settings[EmphasisClass::Weak.index()].is_some(),
                settings[EmphasisClass::Strong.index()].is_some(),
            );

            for class in EmphasisClass::ALL {
                let i = class.index();
                let amount = amounts[i];
                classes.classes[i].amount = amount;
                if amount <= 0.0 {
                    continue;
                }
                let Some((file, setting_idx)) = settings[i] else {
                    continue;
                };
                let Some(mapping) = translations.ensure(file, ctx.registry) else {
                    continue;
                };
                for entry in &file.settings[setting_idx].entries {
                    if let Some(id) = mapping.translate(entry.key) {
                        weights.blend(id, amount * scale * entry.weight, BlendOp::Additive);
                    }
                }
            }
            contributed += 1;
        }
    }
    contributed
}
