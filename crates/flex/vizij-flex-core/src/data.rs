//! Flex-setting data model.
//!
//! A flex-setting file is an immutable asset holding named settings (expressions,
//! visemes). Each setting lists `(local key, weight, influence)` entries where the
//! local key indexes the file's own `keys` table of controller names. Local keys
//! mean nothing outside their file; see `binding::LocalToGlobalMapping`.

use serde::{Deserialize, Serialize};

use crate::error::FlexError;
use crate::ids::SettingFileId;

fn default_influence() -> f32 {
    1.0
}

/// One weighted controller inside a setting.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SettingEntry {
    /// Index into the owning file's `keys` table.
    pub key: u32,
    pub weight: f32,
    #[serde(default = "default_influence")]
    pub influence: f32,
}

/// A named group of controller weights (an expression or a viseme).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LocalSetting {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<SettingEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlexSettingFile {
    /// Assigned when the file is registered with a `FlexSettingLibrary`.
    #[serde(skip)]
    pub id: Option<SettingFileId>,
    pub name: String,
    /// Local key -> controller name.
    pub keys: Vec<String>,
    #[serde(default)]
    pub settings: Vec<LocalSetting>,
}

impl FlexSettingFile {
    #[inline]
    pub fn num_local_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn find_setting(&self, name: &str) -> Option<&LocalSetting> {
        self.settings.iter().find(|s| s.name == name)
    }

    pub fn find_setting_index(&self, name: &str) -> Option<usize> {
        self.settings.iter().position(|s| s.name == name)
    }

    /// Validate basic invariants: keys in range, finite weights, unique setting names.
    pub fn validate_basic(&self) -> Result<(), FlexError> {
        let invalid = |reason: String| FlexError::InvalidSettingFile {
            file: self.name.clone(),
            reason,
        };
        let n = self.keys.len();
        for (i, setting) in self.settings.iter().enumerate() {
            if self.settings[..i].iter().any(|s| s.name == setting.name) {
                return Err(invalid(format!("duplicate setting '{}'", setting.name)));
            }
            for e in &setting.entries {
                if e.key as usize >= n {
                    return Err(invalid(format!(
                        "setting '{}' uses key {} but the file has {} keys",
                        setting.name, e.key, n
                    )));
                }
                if !e.weight.is_finite() || !e.influence.is_finite() {
                    return Err(invalid(format!(
                        "setting '{}' has a non-finite entry",
                        setting.name
                    )));
                }
            }
        }
        Ok(())
    }
}
