//! Local -> global controller translation.
//!
//! Flex-setting files and models both number their controllers locally. Each
//! actor keeps a `TranslationCache` with one `LocalToGlobalMapping` per setting
//! file it has used (built lazily on first use), and a `ModelBinding` for the
//! model it currently renders. Slots whose name could not be registered hold
//! `None` and contribute nothing.

use crate::data::FlexSettingFile;
use crate::ids::{ControllerId, SettingFileId};
use crate::model::ModelDescriptor;
use crate::registry::ControllerRegistry;

fn register_all<'a>(
    names: impl Iterator<Item = &'a str>,
    registry: &ControllerRegistry,
) -> Vec<Option<ControllerId>> {
    names.map(|name| registry.get_or_create(name).ok()).collect()
}

/// Translation table for one flex-setting file.
#[derive(Clone, Debug)]
pub struct LocalToGlobalMapping {
    pub file: SettingFileId,
    pub mapping: Vec<Option<ControllerId>>,
}

impl LocalToGlobalMapping {
    pub fn build(file_id: SettingFileId, file: &FlexSettingFile, registry: &ControllerRegistry) -> Self {
        Self {
            file: file_id,
            mapping: register_all(file.keys.iter().map(String::as_str), registry),
        }
    }

    /// Translate a file-local key.
    ///
    /// A key past the end of the table means the mapping was built for a
    /// different file; that is a logic error, not bad content.
    #[inline]
    pub fn translate(&self, key: u32) -> Option<ControllerId> {
        let slot = self.mapping.get(key as usize);
        debug_assert!(
            slot.is_some(),
            "local key {} used without a mapping entry (file {:?})",
            key,
            self.file
        );
        slot.copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Per-actor cache: one mapping per distinct setting file ever used.
#[derive(Clone, Debug, Default)]
pub struct TranslationCache {
    entries: Vec<LocalToGlobalMapping>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the mapping for `file`, building it on first use.
    ///
    /// Files that were never registered with a library have no id and cannot be
    /// cached; they yield None.
    pub fn ensure(
        &mut self,
        file: &FlexSettingFile,
        registry: &ControllerRegistry,
    ) -> Option<&LocalToGlobalMapping> {
        let Some(id) = file.id else {
            log::debug!("flex setting file '{}' has no id; skipping", file.name);
            return None;
        };
        let pos = match self.entries.iter().position(|m| m.file == id) {
            Some(pos) => pos,
            None => {
                self.entries
                    .push(LocalToGlobalMapping::build(id, file, registry));
                self.entries.len() - 1
            }
        };
        let mapping = &self.entries[pos];
        debug_assert_eq!(mapping.len(), file.num_local_keys());
        Some(mapping)
    }

    pub fn get(&self, id: SettingFileId) -> Option<&LocalToGlobalMapping> {
        self.entries.iter().find(|m| m.file == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Model-local controller index -> global controller.
#[derive(Clone, Debug, Default)]
pub struct ModelBinding {
    pub globals: Vec<Option<ControllerId>>,
}

impl ModelBinding {
    pub fn build(model: &ModelDescriptor, registry: &ControllerRegistry) -> Self {
        Self {
            globals: register_all(model.controllers.iter().map(|c| c.name.as_str()), registry),
        }
    }

    #[inline]
    pub fn global(&self, local: usize) -> Option<ControllerId> {
        self.globals.get(local).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}
