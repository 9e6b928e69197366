use serde::Deserialize;

use crate::data::{FlexSettingFile, LocalSetting, SettingEntry};
use crate::error::FlexError;

/// Public API: parse stored flex-setting JSON into the canonical `FlexSettingFile` (data.rs).
///
/// Notes:
/// - Entries name their controller directly; names are interned into the file's
///   local `keys` table in first-seen order.
/// - `influence` defaults to 1.0 when absent.
/// - The result is validated (`FlexSettingFile::validate_basic`) before returning.
pub fn parse_flex_settings_json(s: &str) -> Result<FlexSettingFile, FlexError> {
    let stored: StoredFlexSettings = serde_json::from_str(s)?;

    let mut keys: Vec<String> = Vec::new();
    let mut settings: Vec<LocalSetting> = Vec::with_capacity(stored.settings.len());
    for ss in stored.settings {
        let mut entries = Vec::with_capacity(ss.weights.len());
        for w in ss.weights {
            let key = match keys.iter().position(|k| *k == w.controller) {
                Some(i) => i,
                None => {
                    keys.push(w.controller);
                    keys.len() - 1
                }
            };
            entries.push(SettingEntry {
                key: key as u32,
                weight: w.weight,
                influence: w.influence.unwrap_or(1.0),
            });
        }
        settings.push(LocalSetting {
            name: ss.name,
            entries,
        });
    }

    let file = FlexSettingFile {
        id: None,
        name: stored.name,
        keys,
        settings,
    };
    file.validate_basic()?;
    Ok(file)
}

#[derive(Debug, Deserialize)]
struct StoredFlexSettings {
    name: String,
    #[serde(default)]
    settings: Vec<StoredSetting>,
}

#[derive(Debug, Deserialize)]
struct StoredSetting {
    name: String,
    #[serde(default)]
    weights: Vec<StoredWeight>,
}

#[derive(Debug, Deserialize)]
struct StoredWeight {
    controller: String,
    weight: f32,
    #[serde(default)]
    influence: Option<f32>,
}
