use std::collections::HashMap;

use crate::descriptor::TypeKey;
use crate::value::{Selector, Signature};

use super::registry::ComponentEntry;

/// What a cached answer is shared by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// One facade instance, identified by its registry.
    Instance(u64),
    /// Every instance of an installed facade type.
    Type(TypeKey),
}

/// Cached answer to "which components implement this selector".
#[derive(Debug, Clone)]
pub struct CacheEntry {
    responders: Vec<ComponentEntry>,
    signature: Option<Signature>,
}

impl CacheEntry {
    pub(crate) fn new(responders: Vec<ComponentEntry>, signature: Option<Signature>) -> Self {
        Self {
            responders,
            signature,
        }
    }

    /// Responders in registration order.
    pub fn responders(&self) -> &[ComponentEntry] {
        &self.responders
    }

    /// Signature taken from the first responder.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// An entry stays valid while all of its responders are alive. A dropped
    /// responder would shift the answer of a fresh pass.
    fn is_valid(&self) -> bool {
        self.responders.iter().all(ComponentEntry::is_present)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoized responder lists, keyed by scope and selector.
#[derive(Debug, Default)]
pub struct ImplementationCache {
    scopes: HashMap<CacheScope, HashMap<Selector, CacheEntry>>,
    stats: CacheStats,
}

impl ImplementationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `name`, if present and still valid. Stale entries
    /// are dropped and count as a miss.
    pub fn lookup(&mut self, scope: CacheScope, name: &str) -> Option<&CacheEntry> {
        let entries = self.scopes.get_mut(&scope);
        let valid = entries
            .as_ref()
            .and_then(|entries| entries.get(name))
            .map(CacheEntry::is_valid);

        match (entries, valid) {
            (Some(entries), Some(true)) => {
                self.stats.hits += 1;
                entries.get(name)
            }
            (Some(entries), Some(false)) => {
                entries.remove(name);
                self.stats.misses += 1;
                None
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, scope: CacheScope, name: Selector, entry: CacheEntry) {
        self.scopes.entry(scope).or_default().insert(name, entry);
    }

    /// Drop every entry of `scope`.
    pub fn invalidate(&mut self, scope: CacheScope) {
        self.scopes.remove(&scope);
    }

    /// Number of cached selectors in `scope`.
    pub fn len(&self, scope: CacheScope) -> usize {
        self.scopes.get(&scope).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self, scope: CacheScope) -> bool {
        self.len(scope) == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
