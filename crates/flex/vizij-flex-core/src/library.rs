//! Load-once cache of flex-setting files shared by every actor.
//!
//! Files are immutable once inserted and handed out as `Arc`s, so readers on any
//! thread can use them without locking. The library lock only guards the
//! name -> file table.

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;

use crate::data::FlexSettingFile;
use crate::error::FlexError;
use crate::ids::IdAllocator;
use crate::stored_settings::parse_flex_settings_json;

#[derive(Debug, Default)]
struct LibraryInner {
    ids: IdAllocator,
    files: HashMap<String, Arc<FlexSettingFile>>,
}

#[derive(Debug, Default)]
pub struct FlexSettingLibrary {
    inner: RwLock<LibraryInner>,
}

impl FlexSettingLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under its own name and assign it an id.
    ///
    /// If a file with that name is already loaded, the cached one is returned and
    /// `file` is dropped.
    pub fn insert(&self, mut file: FlexSettingFile) -> Result<Arc<FlexSettingFile>, FlexError> {
        file.validate_basic()?;
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inner.files.get(&file.name) {
            return Ok(existing.clone());
        }
        file.id = Some(inner.ids.alloc_file());
        log::debug!(
            "loaded flex setting file '{}' ({} keys, {} settings)",
            file.name,
            file.num_local_keys(),
            file.settings.len()
        );
        let file = Arc::new(file);
        inner.files.insert(file.name.clone(), file.clone());
        Ok(file)
    }

    /// Parse stored JSON and register the result.
    pub fn load_json(&self, json: &str) -> Result<Arc<FlexSettingFile>, FlexError> {
        let file = parse_flex_settings_json(json)?;
        self.insert(file)
    }

    pub fn get(&self, name: &str) -> Option<Arc<FlexSettingFile>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.files.get(name).cloned()
    }

    /// Like `get`, but reports the missing name as an error.
    pub fn require(&self, name: &str) -> Result<Arc<FlexSettingFile>, FlexError> {
        self.get(name)
            .ok_or_else(|| FlexError::SettingFileNotFound(name.to_string()))
    }

    /// Resolve `setting` inside file `name`, returning the file and the setting's index.
    pub fn require_setting(
        &self,
        name: &str,
        setting: &str,
    ) -> Result<(Arc<FlexSettingFile>, usize), FlexError> {
        let file = self.require(name)?;
        let idx = file
            .find_setting_index(setting)
            .ok_or_else(|| FlexError::SettingNotFound {
                file: name.to_string(),
                setting: setting.to_string(),
            })?;
        Ok((file, idx))
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
