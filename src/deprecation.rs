//! Write-once deprecation notices
//!
//! Each key is announced at most once per registry. Registries are normally
//! injected through [`crate::AppState`]; [`DeprecationRegistry::global`] is
//! there for code without access to the state.

use crate::logger;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;

static GLOBAL: Lazy<DeprecationRegistry> = Lazy::new(DeprecationRegistry::new);

#[derive(Debug, Default)]
pub struct DeprecationRegistry {
    seen: Mutex<HashSet<String>>,
}

impl DeprecationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Log `message` the first time `key` is seen
    ///
    /// Returns true if this call emitted the warning.
    pub fn warn_once(&self, key: &str, message: &str) -> bool {
        let first = self.seen.lock().insert(key.to_string());
        if first {
            logger::log_deprecation(key, message);
        }
        first
    }

    pub fn has_warned(&self, key: &str) -> bool {
        self.seen.lock().contains(key)
    }

    /// Number of distinct keys warned about
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }

    /// Forget every key seen so far
    pub fn reset(&self) {
        self.seen.lock().clear();
    }
}
