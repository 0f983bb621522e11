use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::descriptor::TypeKey;
use crate::introspect;
use crate::object::{Object, ObjectId};
use crate::value::{Selector, Signature};

use super::cache::{CacheEntry, CacheScope, CacheStats, ImplementationCache};

static NEXT_INSTANCE_SCOPE: AtomicU64 = AtomicU64::new(1);

/// One registered component.
///
/// Holds the component and the composite it was added through without
/// owning either.
#[derive(Clone)]
pub struct ComponentEntry {
    id: ObjectId,
    component: Weak<dyn Object>,
    composite: Weak<dyn Object>,
}

impl ComponentEntry {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The component, or `None` once it has been dropped elsewhere.
    pub fn component(&self) -> Option<Arc<dyn Object>> {
        self.component.upgrade()
    }

    /// The composite this entry was added through, if still alive.
    pub fn composite(&self) -> Option<Arc<dyn Object>> {
        self.composite.upgrade()
    }

    pub fn is_present(&self) -> bool {
        self.component.strong_count() > 0
    }
}

impl fmt::Debug for ComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEntry")
            .field("id", &self.id)
            .field("present", &self.is_present())
            .finish()
    }
}

/// Components implementing one selector, resolved at a single point in time.
#[derive(Clone, Default)]
pub struct Resolution {
    pub components: Vec<Arc<dyn Object>>,
    pub signature: Option<Signature>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

struct RegistryState {
    entries: Vec<ComponentEntry>,
    /// Bumped on every mutation; a resolution computed against an older
    /// generation is not cached.
    generation: u64,
    cache: ImplementationCache,
}

/// Ordered set of components attached to one facade, or to every instance of
/// an installed facade type.
///
/// Entries and cache share one lock. Component operations never run while it
/// is held.
pub struct ComponentRegistry {
    scope: CacheScope,
    state: Mutex<RegistryState>,
}

impl ComponentRegistry {
    /// Registry private to one facade instance.
    pub fn for_instance() -> Self {
        Self::with_scope(CacheScope::Instance(
            NEXT_INSTANCE_SCOPE.fetch_add(1, Ordering::Relaxed),
        ))
    }

    /// Registry shared by every instance of an installed type.
    pub fn for_type(key: TypeKey) -> Self {
        Self::with_scope(CacheScope::Type(key))
    }

    fn with_scope(scope: CacheScope) -> Self {
        Self {
            scope,
            state: Mutex::new(RegistryState {
                entries: Vec::new(),
                generation: 0,
                cache: ImplementationCache::new(),
            }),
        }
    }

    pub fn scope(&self) -> CacheScope {
        self.scope
    }

    /// Append `component` unless it is already registered. Returns whether
    /// an entry was added.
    pub fn add(&self, component: Arc<dyn Object>, composite: Weak<dyn Object>) -> bool {
        let id = ObjectId::of_arc(&component);
        let mut state = self.state.lock();
        state.entries.retain(ComponentEntry::is_present);
        if state.entries.iter().any(|e| e.id == id) {
            trace!(scope = ?self.scope, component = ?id, "component already registered");
            return false;
        }
        state.entries.push(ComponentEntry {
            id,
            component: Arc::downgrade(&component),
            composite,
        });
        self.mutated(&mut state);
        debug!(
            scope = ?self.scope,
            component = ?id,
            type_name = component.descriptor().name(),
            count = state.entries.len(),
            "component added"
        );
        true
    }

    /// Remove the entry for `component`. Returns whether one was removed.
    pub fn remove(&self, component: &dyn Object) -> bool {
        let id = ObjectId::of(component);
        let mut state = self.state.lock();
        let Some(pos) = state.entries.iter().position(|e| e.id == id) else {
            trace!(scope = ?self.scope, component = ?id, "component not registered");
            return false;
        };
        state.entries.remove(pos);
        state.entries.retain(ComponentEntry::is_present);
        self.mutated(&mut state);
        debug!(
            scope = ?self.scope,
            component = ?id,
            count = state.entries.len(),
            "component removed"
        );
        true
    }

    fn mutated(&self, state: &mut RegistryState) {
        state.generation += 1;
        state.cache.invalidate(self.scope);
    }

    /// Number of present components.
    pub fn count(&self) -> usize {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_present())
            .count()
    }

    /// Snapshot of the present entries in registration order.
    pub fn entries(&self) -> Vec<ComponentEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.is_present())
            .cloned()
            .collect()
    }

    /// Snapshot of the present components in registration order.
    pub fn components(&self) -> Vec<Arc<dyn Object>> {
        self.snapshot().0.iter().filter_map(ComponentEntry::component).collect()
    }

    fn snapshot(&self) -> (Vec<ComponentEntry>, u64) {
        let state = self.state.lock();
        (state.entries.clone(), state.generation)
    }

    /// Components implementing `name`, in registration order, together with
    /// the signature of the first one.
    pub fn resolve(&self, name: &str, use_cache: bool) -> Resolution {
        if use_cache {
            if let Some(resolution) = self.resolve_cached(name) {
                return resolution;
            }
        }

        let (entries, generation) = self.snapshot();
        let mut responders = Vec::new();
        let mut resolution = Resolution::default();
        for entry in entries {
            // Absent components implement nothing.
            let Some(component) = entry.component() else {
                continue;
            };
            if let Some(method) = introspect::find_method(&*component, name) {
                if resolution.signature.is_none() {
                    resolution.signature = Some(method.signature().clone());
                }
                responders.push(entry);
                resolution.components.push(component);
            }
        }
        trace!(
            scope = ?self.scope,
            selector = name,
            responders = resolution.components.len(),
            "resolved selector"
        );

        if use_cache {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.cache.insert(
                    self.scope,
                    Selector::new(name),
                    CacheEntry::new(responders, resolution.signature.clone()),
                );
            }
        }
        resolution
    }

    fn resolve_cached(&self, name: &str) -> Option<Resolution> {
        let mut state = self.state.lock();
        let cached = state.cache.lookup(self.scope, name)?;
        let components: Option<Vec<_>> = cached
            .responders()
            .iter()
            .map(ComponentEntry::component)
            .collect();
        trace!(scope = ?self.scope, selector = name, "implementation cache hit");
        Some(Resolution {
            components: components?,
            signature: cached.signature().cloned(),
        })
    }

    /// First present component responding to `name`.
    pub fn first_responder(&self, name: &str, use_cache: bool) -> Option<Arc<dyn Object>> {
        if use_cache {
            return self.resolve(name, true).components.into_iter().next();
        }
        self.snapshot()
            .0
            .iter()
            .filter_map(ComponentEntry::component)
            .find(|component| introspect::responds_to(&**component, name))
    }

    /// First present component that is of kind `key`.
    pub fn first_of_kind(&self, key: TypeKey) -> Option<Arc<dyn Object>> {
        self.snapshot()
            .0
            .iter()
            .filter_map(ComponentEntry::component)
            .find(|component| introspect::is_kind_of(&**component, key))
    }

    pub fn cache_len(&self) -> usize {
        self.state.lock().cache.len(self.scope)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.state.lock().cache.stats()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ComponentRegistry")
            .field("scope", &self.scope)
            .field("entries", &state.entries)
            .field("generation", &state.generation)
            .finish()
    }
}
