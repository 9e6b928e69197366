//! Error types for flex blending.
//!
//! Content problems (missing files, unknown settings) surface here only from the
//! loading/lookup APIs. Blend stages swallow them and contribute nothing.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum FlexError {
    /// The controller registry has no free slot for a new name.
    #[error("controller registry full ({capacity} slots); cannot register '{name}'")]
    RegistryFull { name: String, capacity: usize },

    #[error("flex setting file not found: {0}")]
    SettingFileNotFound(String),

    #[error("setting '{setting}' not found in flex setting file '{file}'")]
    SettingNotFound { file: String, setting: String },

    #[error("invalid flex setting file '{file}': {reason}")]
    InvalidSettingFile { file: String, reason: String },

    #[error("invalid model '{model}': {reason}")]
    InvalidModel { model: String, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    /// Weights were already converted to controller ranges this frame.
    #[error("weights already denormalized for this frame")]
    AlreadyDenormalized,
}

impl From<serde_json::Error> for FlexError {
    fn from(e: serde_json::Error) -> Self {
        FlexError::Parse(e.to_string())
    }
}
