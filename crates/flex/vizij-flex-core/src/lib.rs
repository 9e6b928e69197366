//! Vizij Flex Core (engine-agnostic)
//!
//! Blends facial flex controllers for animated characters. Each frame an actor's
//! normalized weight buffer is seeded from host values, then receives viseme
//! shapes from speech, scene expressions and flex-animation tracks, and
//! bone-driven overrides, before being converted to the model's controller ranges.
//!
//! Controllers are identified globally through a shared `ControllerRegistry`;
//! flex-setting files and models translate their local controller lists into
//! that namespace once and cache the result per actor.

pub mod accumulate;
pub mod actor;
pub mod binding;
pub mod blink;
pub mod bone_driver;
pub mod choreography;
pub mod config;
pub mod data;
pub mod delay;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod library;
pub mod model;
pub mod outputs;
pub mod phoneme;
pub mod registry;
pub mod sampling;
pub mod scratch;
pub mod stored_settings;

// Re-exports for consumers (hosts and adapters)
pub use accumulate::{denormalize, normalize, BlendOp};
pub use actor::{FlexActor, FlexBlendTarget, FlexState};
pub use binding::{LocalToGlobalMapping, ModelBinding, TranslationCache};
pub use blink::BlinkState;
pub use bone_driver::PoseSource;
pub use choreography::{FlexAnimTrack, SceneEvent, SceneEventBinding, SceneEventKind};
pub use config::{Config, PhonemeFiles};
pub use data::{FlexSettingFile, LocalSetting, SettingEntry};
pub use delay::DelayFilter;
pub use engine::{run_frame, BlendContext};
pub use error::FlexError;
pub use ids::{ControllerId, EventId, IdAllocator, SettingFileId};
pub use inputs::FrameInputs;
pub use library::FlexSettingLibrary;
pub use model::{BoneAxis, BoneFlexDriverRule, ControllerDesc, ModelDescriptor};
pub use outputs::{FrameOutput, FrameStats};
pub use phoneme::{EmphasisClass, PhonemeTag, SentenceVoice, VoiceSource};
pub use registry::ControllerRegistry;
pub use sampling::{sample_curve, FlexCurve};
pub use scratch::WeightBuffer;
pub use stored_settings::parse_flex_settings_json;
