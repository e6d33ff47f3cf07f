//! Concurrent per-object registries keyed by dispatch key.
//!
//! A dispatch key is derived from a dispatchable handle and identifies the
//! underlying driver object family; it is only ever used as a map key, never
//! dereferenced. The layer keeps one registry per concern (forwarding tables,
//! per-object records) and per scope (instance, device).

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::contract_violation;

/// Opaque handle-derived identifier, stable for the lifetime of the object
/// it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchKey(pub usize);

/// Map from dispatch key to a shared per-object value.
///
/// The lifecycle contract is strict: a key is registered exactly once, before
/// any intercepted call can observe it, and erased exactly once at object
/// destruction. The asserting accessors fail fast on a broken contract;
/// [`DispatchRegistry::try_get`] is the non-asserting lookup for paths where
/// absence is legitimate.
pub struct DispatchRegistry<T> {
    entries: DashMap<DispatchKey, Arc<T>>,
}

impl<T> DispatchRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Register a value for `key`. Double registration of a live key is a
    /// contract violation.
    pub fn insert(&self, key: DispatchKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        if self.entries.insert(key, value.clone()).is_some() {
            contract_violation(&format!("dispatch key {:#x} registered twice", key.0));
        }
        value
    }

    /// Look up the value for `key`. The key must have been registered; the
    /// registry is primed during the handshake before first use.
    pub fn get(&self, key: DispatchKey) -> Arc<T> {
        match self.entries.get(&key) {
            Some(entry) => Arc::clone(entry.value()),
            None => contract_violation(&format!("no entry for dispatch key {:#x}", key.0)),
        }
    }

    /// Non-asserting lookup.
    pub fn try_get(&self, key: DispatchKey) -> Option<Arc<T>> {
        self.entries.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// Erase the entry for `key` and return it. Erasing a key that is not
    /// registered (double-erase) is a contract violation.
    pub fn remove(&self, key: DispatchKey) -> Arc<T> {
        match self.entries.remove(&key) {
            Some((_, value)) => value,
            None => contract_violation(&format!(
                "dispatch key {:#x} erased twice or never registered",
                key.0
            )),
        }
    }

    pub fn contains(&self, key: DispatchKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for DispatchRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
