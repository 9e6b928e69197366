//! Per-actor flex state and the `FlexBlendTarget` capability.
//!
//! Anything that owns a `FlexState` can be blended by `engine::run_frame`. The
//! state holds the actor's own weight buffer and translation cache, so actors
//! never share mutable data and may be stepped on different threads.

use std::sync::Arc;

use crate::accumulate::normalize;
use crate::binding::{ModelBinding, TranslationCache};
use crate::blink::BlinkState;
use crate::choreography::{ChoreographyState, SceneEvent};
use crate::config::Config;
use crate::delay::DelayFilter;
use crate::engine::BlendContext;
use crate::error::FlexError;
use crate::ids::EventId;
use crate::model::ModelDescriptor;
use crate::phoneme::PhonemeClasses;
use crate::registry::ControllerRegistry;
use crate::scratch::WeightBuffer;

#[derive(Debug)]
pub struct FlexState {
    pub(crate) model: Option<Arc<ModelDescriptor>>,
    pub(crate) binding: ModelBinding,
    pub(crate) weights: WeightBuffer,
    pub(crate) translations: TranslationCache,
    pub(crate) phonemes: PhonemeClasses,
    pub(crate) choreography: ChoreographyState,
    pub(crate) delay: DelayFilter,
    pub(crate) blink: BlinkState,
    /// Host-supplied normalized weights, in model-local order.
    pub(crate) authoritative: Vec<f32>,
}

impl FlexState {
    pub fn new(cfg: &Config) -> Self {
        Self {
            model: None,
            binding: ModelBinding::default(),
            weights: WeightBuffer::new(cfg.controller_capacity),
            translations: TranslationCache::new(),
            phonemes: PhonemeClasses::new(),
            choreography: ChoreographyState::new(),
            delay: DelayFilter::new(),
            blink: BlinkState::new(),
            authoritative: Vec::new(),
        }
    }

    /// Swap the rendered model. Rebuilds the model binding and resets the
    /// host weights and delay filter; None leaves the actor without a model.
    pub fn set_model(
        &mut self,
        model: Option<Arc<ModelDescriptor>>,
        registry: &ControllerRegistry,
    ) -> Result<(), FlexError> {
        if let Some(m) = &model {
            m.validate_basic()?;
        }
        self.binding = match &model {
            Some(m) => ModelBinding::build(m, registry),
            None => ModelBinding::default(),
        };
        self.authoritative = vec![0.0; self.binding.len()];
        self.delay.reset();
        self.model = model;
        Ok(())
    }

    pub fn model(&self) -> Option<&ModelDescriptor> {
        self.model.as_deref()
    }

    pub fn binding(&self) -> &ModelBinding {
        &self.binding
    }

    /// Set a controller from a value in its declared range.
    pub fn set_controller_value(&mut self, local: usize, value: f32) -> bool {
        let Some(desc) = self.model.as_ref().and_then(|m| m.controllers.get(local)) else {
            return false;
        };
        let w = normalize(value, desc.min, desc.max);
        self.set_controller_weight(local, w)
    }

    pub fn set_controller_value_by_name(&mut self, name: &str, value: f32) -> bool {
        match self.model.as_ref().and_then(|m| m.find_controller(name)) {
            Some(local) => self.set_controller_value(local, value),
            None => false,
        }
    }

    /// Set a controller's normalized weight directly.
    pub fn set_controller_weight(&mut self, local: usize, weight: f32) -> bool {
        match self.authoritative.get_mut(local) {
            Some(slot) => {
                *slot = weight.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn controller_weight(&self, local: usize) -> Option<f32> {
        self.authoritative.get(local).copied()
    }

    pub fn event_started(&mut self, event: SceneEvent, ctx: &BlendContext) {
        self.choreography.event_started(event, ctx);
    }

    pub fn event_ended(&mut self, id: EventId) -> bool {
        self.choreography.event_ended(id)
    }

    pub fn choreography(&self) -> &ChoreographyState {
        &self.choreography
    }

    pub fn translations(&self) -> &TranslationCache {
        &self.translations
    }

    pub fn phoneme_classes(&self) -> &PhonemeClasses {
        &self.phonemes
    }

    /// Drop the resolved phoneme files so the next frame looks them up again,
    /// picking up class files loaded after the first evaluation.
    pub fn reload_phoneme_classes(&mut self) {
        self.phonemes.invalidate();
    }

    pub fn weights(&self) -> &WeightBuffer {
        &self.weights
    }

    pub fn delay(&self) -> &DelayFilter {
        &self.delay
    }
}

/// Something that exposes a model's controller table and owns the per-instance
/// buffers needed to blend it.
pub trait FlexBlendTarget {
    fn flex_state(&self) -> &FlexState;
    fn flex_state_mut(&mut self) -> &mut FlexState;

    fn model(&self) -> Option<&ModelDescriptor> {
        self.flex_state().model()
    }
}

/// Stock `FlexBlendTarget` for hosts without their own actor type.
#[derive(Debug)]
pub struct FlexActor {
    pub name: String,
    state: FlexState,
}

impl FlexActor {
    pub fn new(name: &str, cfg: &Config) -> Self {
        Self {
            name: name.to_string(),
            state: FlexState::new(cfg),
        }
    }

    pub fn with_model(
        mut self,
        model: Arc<ModelDescriptor>,
        registry: &ControllerRegistry,
    ) -> Result<Self, FlexError> {
        self.state.set_model(Some(model), registry)?;
        Ok(self)
    }
}

impl FlexBlendTarget for FlexActor {
    fn flex_state(&self) -> &FlexState {
        &self.state
    }

    fn flex_state_mut(&mut self) -> &mut FlexState {
        &mut self.state
    }
}
