//! Per-frame blend pipeline.
//!
//! `run_frame` drives one actor through its stages in a fixed order:
//!
//! 1. reset the weight buffer and seed it with the host's authoritative weights
//!    and any running blink
//! 2. viseme blending from the active voices (additive)
//! 3. scene events in start order (weighted overwrite)
//! 4. bone-driven controllers (overwrite)
//! 5. denormalization into the model's controller ranges
//! 6. optional delayed copy of the result
//!
//! Shared state (controller registry, setting library, config) is passed in
//! through a `BlendContext` and only read here, so separate actors can run on
//! separate threads.

use crate::accumulate::BlendOp;
use crate::actor::FlexBlendTarget;
use crate::bone_driver::drive_from_bones;
use crate::choreography::blend_scene_events;
use crate::config::Config;
use crate::inputs::FrameInputs;
use crate::library::FlexSettingLibrary;
use crate::outputs::{FrameOutput, FrameStats};
use crate::phoneme::blend_visemes;
use crate::registry::{self, ControllerRegistry};

/// Read-only collaborators shared by every actor in a frame.
#[derive(Clone, Copy, Debug)]
pub struct BlendContext<'a> {
    pub registry: &'a ControllerRegistry,
    pub library: &'a FlexSettingLibrary,
    pub config: &'a Config,
}

impl<'a> BlendContext<'a> {
    pub fn new(
        registry: &'a ControllerRegistry,
        library: &'a FlexSettingLibrary,
        config: &'a Config,
    ) -> Self {
        Self {
            registry,
            library,
            config,
        }
    }

    /// Context over the process-wide controller registry.
    pub fn with_global_registry(library: &'a FlexSettingLibrary, config: &'a Config) -> Self {
        Self::new(registry::global(), library, config)
    }
}

/// Blend one frame for `target`. Returns None when it has no model.
pub fn run_frame<T: FlexBlendTarget + ?Sized>(
    target: &mut T,
    ctx: &BlendContext,
    inputs: &FrameInputs,
) -> Option<FrameOutput> {
    let state = target.flex_state_mut();
    let model = state.model.clone()?;
    let mut stats = FrameStats::default();

    // 1. seed
    state.weights.begin_frame();
    for (local, w) in state.authoritative.iter().enumerate() {
        if let Some(id) = state.binding.global(local) {
            state.weights.blend(id, *w, BlendOp::Overwrite);
        }
    }
    if let Some(toggle) = inputs.blink_toggle {
        state
            .blink
            .observe(toggle, inputs.now, ctx.config.blink_duration);
    }
    stats.blink = state.blink.apply(
        inputs.now,
        ctx.config.blink_duration,
        ctx.registry,
        &mut state.weights,
    );

    // 2. visemes
    stats.visemes = blend_visemes(
        &mut state.phonemes,
        &mut state.translations,
        &mut state.weights,
        &inputs.voices,
        inputs.dt,
        ctx,
    );

    // 3. scene events
    if let Some(scene_time) = inputs.scene_time {
        stats.scene_events = blend_scene_events(
            &mut state.choreography,
            &mut state.translations,
            &mut state.weights,
            scene_time,
            ctx,
        );
    }

    // 4. bone drivers
    if let Some(pose) = inputs.pose {
        stats.bone_drivers = drive_from_bones(&model, &state.binding, &mut state.weights, pose);
    }

    // 5. denormalize
    let mut weights = Vec::with_capacity(model.controllers.len());
    if let Err(e) = state
        .weights
        .denormalize_into(&model, &state.binding, &mut weights)
    {
        log::error!("flex frame for model '{}' aborted: {}", model.name, e);
        return None;
    }

    // 6. delayed copy
    let delayed = ctx
        .config
        .delayed_weights
        .then(|| state.delay.update(inputs.now, inputs.dt, &weights).to_vec());

    log::trace!(
        "flex frame '{}': {} visemes, {} events, {} bone drivers",
        model.name,
        stats.visemes,
        stats.scene_events,
        stats.bone_drivers
    );

    Some(FrameOutput {
        weights,
        delayed,
        stats,
    })
}
