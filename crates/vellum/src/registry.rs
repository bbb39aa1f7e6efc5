//! Decorator and scope behavior registries.
//!
//! Registries are populated at configuration time: names map to behavior
//! handles, and a miss is a plain fallback to the default behavior. There is
//! no runtime probing and no exception-based control flow in a lookup.
//!
//! Registry keys are camelized type names (`"user_article"` resolves against
//! the key `"UserArticle"`), so registrations read like the type names they
//! stand in for.
//!
//! [`ResolutionCache`] memoizes resolved behaviors per builder. It is an
//! explicit, injectable object — tests can clear it — and safe for concurrent
//! renders.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::part::PartBehavior;
use crate::scope::ScopeBehavior;

/// Thread-safe memo of name → resolved behavior.
pub struct ResolutionCache<T> {
    entries: Arc<RwLock<HashMap<String, T>>>,
}

impl<T> Clone for ResolutionCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for ResolutionCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone> ResolutionCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for `key`, computing and storing it on miss.
    pub fn get_or_insert(&self, key: &str, compute: impl FnOnce() -> T) -> T {
        {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = entries.get(key) {
                return hit.clone();
            }
        }
        let value = compute();
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .entry(key.to_string())
            .or_insert_with(|| value.clone())
            .clone()
    }

    /// Drops all cached entries.
    pub fn clear(&self) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    /// Number of cached resolutions.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for ResolutionCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entries", &self.len_untyped())
            .finish()
    }
}

impl<T> ResolutionCache<T> {
    fn len_untyped(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

/// Named decorator behaviors for part building.
#[derive(Clone, Default)]
pub struct PartRegistry {
    entries: HashMap<String, Arc<dyn PartBehavior>>,
}

impl PartRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a behavior under a camelized type name, builder-style.
    pub fn add(mut self, name: impl Into<String>, behavior: Arc<dyn PartBehavior>) -> Self {
        self.entries.insert(name.into(), behavior);
        self
    }

    /// Looks up a behavior by registry key.
    pub fn get(&self, key: &str) -> Option<Arc<dyn PartBehavior>> {
        self.entries.get(key).cloned()
    }

    /// True if the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered behaviors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PartRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Named scope behaviors for scope building.
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    entries: HashMap<String, Arc<dyn ScopeBehavior>>,
}

impl ScopeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a behavior under a camelized type name, builder-style.
    pub fn add(mut self, name: impl Into<String>, behavior: Arc<dyn ScopeBehavior>) -> Self {
        self.entries.insert(name.into(), behavior);
        self
    }

    /// Looks up a behavior by registry key.
    pub fn get(&self, key: &str) -> Option<Arc<dyn ScopeBehavior>> {
        self.entries.get(key).cloned()
    }

    /// True if the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered behaviors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
