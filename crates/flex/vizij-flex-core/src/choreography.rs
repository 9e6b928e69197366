//! Scene event blending: named expressions and raw flex-animation tracks.
//!
//! The scene collaborator notifies `event_started`/`event_ended`; in between, each
//! frame evaluates the active events in the order they started. Both event kinds
//! cross-fade over whatever is already in the weight buffer, so a later event
//! wins on any controller it also touches.
//!
//! Curves on an event (intensity, tracks) are sampled relative to the event's
//! start time while the public API takes scene time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::accumulate::BlendOp;
use crate::binding::TranslationCache;
use crate::data::FlexSettingFile;
use crate::engine::BlendContext;
use crate::ids::{ControllerId, EventId};
use crate::sampling::FlexCurve;
use crate::scratch::WeightBuffer;

/// Per-frame increase of a flex-animation event's background weight.
pub const BACKGROUND_RAMP_STEP: f32 = 0.1;

/// A named flex-animation track. Combo tracks drive a `left_`/`right_` pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlexAnimTrack {
    pub name: String,
    #[serde(default)]
    pub combo: bool,
    pub samples: FlexCurve,
    /// Combo only: 0 = left side only, 0.5 = both, 1 = right side only.
    #[serde(default)]
    pub balance: Option<FlexCurve>,
}

impl FlexAnimTrack {
    pub fn new(name: &str, samples: FlexCurve) -> Self {
        Self {
            name: name.to_string(),
            combo: false,
            samples,
            balance: None,
        }
    }

    pub fn combo(name: &str, samples: FlexCurve, balance: Option<FlexCurve>) -> Self {
        Self {
            name: name.to_string(),
            combo: true,
            samples,
            balance,
        }
    }
}

/// Split a combo value into (left, right) by balance.
#[inline]
pub fn split_balance(value: f32, balance: f32) -> (f32, f32) {
    let b = balance.clamp(0.0, 1.0);
    let left = value * (2.0 * (1.0 - b)).min(1.0);
    let right = value * (2.0 * b).min(1.0);
    (left, right)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SceneEventKind {
    /// Apply a named setting from a flex-setting file.
    Expression { file: String, setting: String },
    /// Drive controllers from authored curves.
    FlexAnimation { tracks: Vec<FlexAnimTrack> },
    /// Events that do not touch flex weights.
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SceneEvent {
    pub id: EventId,
    pub kind: SceneEventKind,
    pub start_time: f32,
    pub end_time: f32,
    #[serde(default = "full_intensity")]
    pub intensity: FlexCurve,
}

fn full_intensity() -> FlexCurve {
    FlexCurve::constant(1.0)
}

impl SceneEvent {
    pub fn new(id: EventId, kind: SceneEventKind, start_time: f32, end_time: f32) -> Self {
        Self {
            id,
            kind,
            start_time,
            end_time,
            intensity: full_intensity(),
        }
    }

    pub fn with_intensity(mut self, intensity: FlexCurve) -> Self {
        self.intensity = intensity;
        self
    }

    /// Check every curve the event carries (intensity, track samples, balance).
    pub fn validate_basic(&self) -> Result<(), String> {
        self.intensity
            .validate_basic()
            .map_err(|e| format!("intensity: {e}"))?;
        if let SceneEventKind::FlexAnimation { tracks } = &self.kind {
            for track in tracks {
                track
                    .samples
                    .validate_basic()
                    .map_err(|e| format!("track '{}': {e}", track.name))?;
                if let Some(balance) = &track.balance {
                    balance
                        .validate_basic()
                        .map_err(|e| format!("track '{}' balance: {e}", track.name))?;
                }
            }
        }
        Ok(())
    }

    /// Event intensity at `scene_time`, clamped to [0,1].
    pub fn intensity_at(&self, scene_time: f32) -> f32 {
        self.intensity
            .sample(scene_time - self.start_time)
            .clamp(0.0, 1.0)
    }
}

/// Fade-in state for an event targeting this actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneEventBinding {
    pub event: EventId,
    pub started: bool,
    /// Background ramp in [0,1]; only increases while the binding lives.
    pub weight: f32,
}

impl SceneEventBinding {
    pub fn new(event: EventId) -> Self {
        Self {
            event,
            started: false,
            weight: 0.0,
        }
    }

    /// Advance the ramp by one frame and return the new weight.
    pub fn ramp(&mut self) -> f32 {
        self.started = true;
        if self.weight < 1.0 {
            self.weight += BACKGROUND_RAMP_STEP;
            // absorb accumulated rounding so ten steps land exactly on 1.0
            if self.weight > 1.0 - 1e-4 {
                self.weight = 1.0;
            }
        }
        self.weight
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TrackBinding {
    Unbound,
    Single(Option<ControllerId>),
    Combo {
        left: Option<ControllerId>,
        right: Option<ControllerId>,
    },
}

#[derive(Clone, Debug)]
struct ResolvedExpression {
    file: Arc<FlexSettingFile>,
    setting: usize,
}

#[derive(Clone, Debug)]
struct ActiveEvent {
    event: SceneEvent,
    binding: SceneEventBinding,
    expression: Option<ResolvedExpression>,
    tracks: Vec<TrackBinding>,
}

/// Per-actor list of active scene events, in start order.
#[derive(Clone, Debug, Default)]
pub struct ChoreographyState {
    events: Vec<ActiveEvent>,
}

impl ChoreographyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking `event`. Expressions are resolved here, once.
    ///
    /// Restarting an event that is already active recreates its binding, which
    /// resets its ramp and moves it to the end of the evaluation order. Events
    /// with malformed curves are ignored.
    pub fn event_started(&mut self, event: SceneEvent, ctx: &BlendContext) {
        if let Err(e) = event.validate_basic() {
            log::debug!("scene event {} ignored: {}", event.id.0, e);
            return;
        }
        self.event_ended(event.id);

        let expression = match &event.kind {
            SceneEventKind::Expression { file, setting } => {
                resolve_expression(file, setting, ctx)
            }
            _ => None,
        };
        let tracks = match &event.kind {
            SceneEventKind::FlexAnimation { tracks } => vec![TrackBinding::Unbound; tracks.len()],
            _ => Vec::new(),
        };
        self.events.push(ActiveEvent {
            binding: SceneEventBinding::new(event.id),
            event,
            expression,
            tracks,
        });
    }

    /// Stop tracking an event. Returns false if it was not active.
    pub fn event_ended(&mut self, id: EventId) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.event.id != id);
        before != self.events.len()
    }

    pub fn binding(&self, id: EventId) -> Option<&SceneEventBinding> {
        self.events
            .iter()
            .find(|e| e.event.id == id)
            .map(|e| &e.binding)
    }

    pub fn active_events(&self) -> impl Iterator<Item = &SceneEvent> {
        self.events.iter().map(|e| &e.event)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

fn resolve_expression(file: &str, setting: &str, ctx: &BlendContext) -> Option<ResolvedExpression> {
    match ctx.library.require_setting(file, setting) {
        Ok((file, setting)) => Some(ResolvedExpression { file, setting }),
        Err(e) => {
            log::debug!("expression event unresolved: {}", e);
            None
        }
    }
}

fn bind_track(track: &FlexAnimTrack, ctx: &BlendContext) -> TrackBinding {
    if track.combo {
        TrackBinding::Combo {
            left: ctx
                .registry
                .get_or_create(&format!("left_{}", track.name))
                .ok(),
            right: ctx
                .registry
                .get_or_create(&format!("right_{}", track.name))
                .ok(),
        }
    } else {
        TrackBinding::Single(ctx.registry.get_or_create(&track.name).ok())
    }
}

/// Evaluate every active event at `scene_time`.
///
/// Returns how many events wrote to the buffer. Unresolved events are skipped.
pub fn blend_scene_events(
    state: &mut ChoreographyState,
    translations: &mut TranslationCache,
    weights: &mut WeightBuffer,
    scene_time: f32,
    ctx: &BlendContext,
) -> usize {
    let mut applied = 0;
    for active in &mut state.events {
        match &active.event.kind {
            SceneEventKind::Expression { .. } => {
                let Some(expr) = &active.expression else {
                    continue;
                };
                let scale = active.event.intensity_at(scene_time);
                active.binding.started = true;
                let Some(mapping) = translations.ensure(&expr.file, ctx.registry) else {
                    continue;
                };
                for entry in &expr.file.settings[expr.setting].entries {
                    let s = (scale * entry.influence).clamp(0.0, 1.0);
                    if let Some(id) = mapping.translate(entry.key) {
                        weights.blend(id, entry.weight, BlendOp::WeightedOverwrite { amount: s });
                    }
                }
                applied += 1;
            }
            SceneEventKind::FlexAnimation { tracks } => {
                let background = active.binding.ramp();
                let local_t = scene_time - active.event.start_time;
                let op = BlendOp::WeightedOverwrite { amount: background };
                for (track, bound) in tracks.iter().zip(active.tracks.iter_mut()) {
                    if *bound == TrackBinding::Unbound {
                        *bound = bind_track(track, ctx);
                    }
                    let value = track.samples.sample(local_t);
                    match *bound {
                        TrackBinding::Single(Some(id)) => {
                            weights.blend(id, value, op);
                        }
                        TrackBinding::Combo { left, right } => {
                            let balance = track
                                .balance
                                .as_ref()
                                .map(|b| b.sample(local_t))
                                .unwrap_or(0.5);
                            let (lv, rv) = split_balance(value, balance);
                            if let Some(id) = left {
                                weights.blend(id, lv, op);
                            }
                            if let Some(id) = right {
                                weights.blend(id, rv, op);
                            }
                        }
                        _ => {}
                    }
                }
                applied += 1;
            }
            SceneEventKind::Other => {}
        }
    }
    applied
}
