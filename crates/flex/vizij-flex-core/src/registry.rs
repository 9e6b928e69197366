//! Process-wide controller namespace.
//!
//! Every model and flex-setting file names its controllers locally; this registry
//! assigns each distinct name one stable `ControllerId` so that a single weight
//! vector can hold one slot per logical controller across all actors.
//!
//! Names are matched case-sensitively and indices are handed out in insertion
//! order. Entries are never removed while the registry lives.

use std::sync::{PoisonError, RwLock};

use hashbrown::{HashMap, HashSet};
use once_cell::sync::Lazy;

use crate::error::FlexError;
use crate::ids::ControllerId;

/// Slots available in the process-wide registry.
pub const DEFAULT_CONTROLLER_CAPACITY: usize = 1024;

static GLOBAL: Lazy<ControllerRegistry> =
    Lazy::new(|| ControllerRegistry::with_capacity(DEFAULT_CONTROLLER_CAPACITY));

/// The shared registry, created on first use and kept for the rest of the process.
pub fn global() -> &'static ControllerRegistry {
    &GLOBAL
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: HashMap<String, ControllerId>,
    names: Vec<String>,
    /// Names refused because the registry was full; logged once each.
    rejected: HashSet<String>,
}

/// Concurrent get-or-insert map from controller name to `ControllerId`.
///
/// Only lookups are exposed so callers cannot break the name/index bijection.
#[derive(Debug)]
pub struct ControllerRegistry {
    capacity: usize,
    inner: RwLock<RegistryInner>,
}

impl ControllerRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Return the index for `name`, registering it if this is the first time it is seen.
    ///
    /// Two threads racing on the same new name both observe the same index.
    pub fn get_or_create(&self, name: &str) -> Result<ControllerId, FlexError> {
        if let Some(id) = self.find(name) {
            return Ok(id);
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have inserted between the read and write locks.
        if let Some(id) = inner.by_name.get(name) {
            return Ok(*id);
        }
        if inner.names.len() >= self.capacity {
            if inner.rejected.insert(name.to_string()) {
                log::warn!(
                    "controller registry full ({} slots); '{}' will contribute nothing",
                    self.capacity,
                    name
                );
            }
            return Err(FlexError::RegistryFull {
                name: name.to_string(),
                capacity: self.capacity,
            });
        }
        let id = ControllerId(inner.names.len() as u32);
        inner.names.push(name.to_string());
        inner.by_name.insert(name.to_string(), id);
        log::trace!("registered flex controller '{}' as {}", name, id.0);
        Ok(id)
    }

    /// Look up an already registered name without inserting.
    pub fn find(&self, name: &str) -> Option<ControllerId> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_name.get(name).copied()
    }

    /// Name registered at `id`, or None when the index was never assigned.
    pub fn name_of(&self, id: ControllerId) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.names.get(id.index()).cloned()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CONTROLLER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_assigns_indices() {
        let reg = ControllerRegistry::with_capacity(8);
        assert_eq!(reg.get_or_create("jaw_drop").unwrap(), ControllerId(0));
        assert_eq!(reg.get_or_create("blink").unwrap(), ControllerId(1));
        assert_eq!(reg.get_or_create("jaw_drop").unwrap(), ControllerId(0));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn names_are_case_sensitive() {
        let reg = ControllerRegistry::with_capacity(8);
        let a = reg.get_or_create("Blink").unwrap();
        let b = reg.get_or_create("blink").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn name_of_out_of_range_is_none() {
        let reg = ControllerRegistry::with_capacity(4);
        reg.get_or_create("smile").unwrap();
        assert_eq!(reg.name_of(ControllerId(0)).as_deref(), Some("smile"));
        assert_eq!(reg.name_of(ControllerId(1)), None);
        assert_eq!(reg.name_of(ControllerId(u32::MAX)), None);
    }

    #[test]
    fn full_registry_rejects_new_names_but_keeps_old() {
        let reg = ControllerRegistry::with_capacity(1);
        let a = reg.get_or_create("a").unwrap();
        let err = reg.get_or_create("b").unwrap_err();
        assert!(matches!(err, FlexError::RegistryFull { capacity: 1, .. }));
        assert!(reg.get_or_create("b").is_err());
        assert_eq!(reg.get_or_create("a").unwrap(), a);
        assert_eq!(reg.len(), 1);
    }
}
