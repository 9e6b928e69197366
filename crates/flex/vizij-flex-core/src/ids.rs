//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Index of a controller in the process-wide controller namespace.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

impl ControllerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SettingFileId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);

/// Monotonic allocator for SettingFileId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_file: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_file(&mut self) -> SettingFileId {
        let id = SettingFileId(self.next_file);
        self.next_file = self.next_file.wrapping_add(1);
        id
    }
}
