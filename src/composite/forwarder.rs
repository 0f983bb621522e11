use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::descriptor::{TypeDescriptor, TypeKey};
use crate::error::CompositeError;
use crate::introspect;
use crate::object::Object;
use crate::value::{Signature, Val};

use super::cache::CacheStats;
use super::installer::{ClassRegistry, InstallStrategy, InstalledClass};
use super::invocation::Invocation;
use super::options::ForwarderOptions;
use super::registry::{ComponentEntry, ComponentRegistry};

/// Forwarding state owned by one facade.
///
/// Operations the facade implements itself are answered natively; anything
/// else is resolved against the registered components in registration
/// order. With `MODIFY_CLASS` or `CREATE_CLASS` the registry is shared by
/// every instance of the facade type.
pub struct CompositeForwarder {
    options: ForwarderOptions,
    parent: Weak<dyn Object>,
    registry: Arc<ComponentRegistry>,
    class: Option<Arc<InstalledClass>>,
    /// Cleared when a `CREATE_CLASS` instance reverts to its original type.
    migrated: AtomicBool,
}

impl CompositeForwarder {
    /// Create the forwarder for `parent`, an instance of `facade_type`,
    /// installing through the process-wide [`ClassRegistry`].
    pub fn new(
        options: ForwarderOptions,
        facade_type: &Arc<TypeDescriptor>,
        parent: Weak<dyn Object>,
    ) -> Result<Self, CompositeError> {
        Self::in_registry(ClassRegistry::global(), options, facade_type, parent)
    }

    pub fn in_registry(
        classes: &ClassRegistry,
        options: ForwarderOptions,
        facade_type: &Arc<TypeDescriptor>,
        parent: Weak<dyn Object>,
    ) -> Result<Self, CompositeError> {
        let class = classes.ensure_installed(options, facade_type)?;
        Ok(Self::from_parts(options, class, parent))
    }

    /// `options` must already be validated and `class` installed for them.
    pub(crate) fn from_parts(
        options: ForwarderOptions,
        class: Option<Arc<InstalledClass>>,
        parent: Weak<dyn Object>,
    ) -> Self {
        let registry = match &class {
            Some(class) => class.registry().clone(),
            None => Arc::new(ComponentRegistry::for_instance()),
        };
        Self {
            options,
            parent,
            registry,
            class,
            migrated: AtomicBool::new(true),
        }
    }

    pub fn options(&self) -> ForwarderOptions {
        self.options
    }

    /// The facade, if it is still alive.
    pub fn parent(&self) -> Option<Arc<dyn Object>> {
        self.parent.upgrade()
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn installed_class(&self) -> Option<&Arc<InstalledClass>> {
        self.class.as_ref()
    }

    /// Whether the facade currently forwards. Only a reverted
    /// `CREATE_CLASS` instance does not.
    pub fn is_forwarding(&self) -> bool {
        self.migrated.load(Ordering::Acquire)
    }

    /// Synthesized type the facade carries while migrated, if any.
    pub fn migrated_type(&self) -> Option<&Arc<TypeDescriptor>> {
        match &self.class {
            Some(class)
                if class.strategy() == InstallStrategy::CreateClass && self.is_forwarding() =>
            {
                Some(class.installed())
            }
            _ => None,
        }
    }

    /// Return a `CREATE_CLASS` instance to its original type. The instance
    /// stops forwarding; other instances are unaffected.
    pub fn revert_class(&self) -> bool {
        self.set_migrated(false)
    }

    /// Move a reverted `CREATE_CLASS` instance back onto the synthesized type.
    pub fn migrate_class(&self) -> bool {
        self.set_migrated(true)
    }

    fn set_migrated(&self, migrated: bool) -> bool {
        let Some(class) = &self.class else {
            return false;
        };
        if class.strategy() != InstallStrategy::CreateClass {
            return false;
        }
        let changed = self.migrated.swap(migrated, Ordering::AcqRel) != migrated;
        if changed {
            debug!(
                original = class.original().name(),
                installed = class.installed().name(),
                migrated = migrated,
                "changed composite type identity"
            );
        }
        changed
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Register `component`. Re-adding is a no-op; so is adding through a
    /// reverted instance.
    pub fn add_component(&self, component: Arc<dyn Object>) {
        if !self.is_forwarding() {
            debug!("ignoring add_component on reverted composite");
            return;
        }
        self.registry.add(component, self.parent.clone());
    }

    /// Unregister `component`; no-op if it is not registered.
    pub fn remove_component(&self, component: &dyn Object) {
        if !self.is_forwarding() {
            debug!("ignoring remove_component on reverted composite");
            return;
        }
        self.registry.remove(component);
    }

    pub fn component_count(&self) -> usize {
        self.registry.count()
    }

    pub fn entries(&self) -> Vec<ComponentEntry> {
        self.registry.entries()
    }

    pub fn components(&self) -> Vec<Arc<dyn Object>> {
        self.registry.components()
    }

    pub fn component_implementation_count(&self, selector: &str) -> usize {
        self.components_implementing_selector(selector).len()
    }

    /// Components implementing `selector`, in registration order.
    pub fn components_implementing_selector(&self, selector: &str) -> Vec<Arc<dyn Object>> {
        self.registry
            .resolve(selector, self.options.uses_cache())
            .components
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.registry.cache_stats()
    }

    // =========================================================================
    // Interception points
    // =========================================================================

    /// Facade satisfies `ty`, or else any component does.
    pub fn is_kind_of(&self, ty: TypeKey) -> bool {
        if self
            .parent()
            .is_some_and(|parent| introspect::is_kind_of(&*parent, ty))
        {
            return true;
        }
        self.is_forwarding() && self.registry.first_of_kind(ty).is_some()
    }

    /// Facade implements `selector`, or else any component does.
    pub fn responds_to(&self, selector: &str) -> bool {
        if self.responds_natively(selector) {
            return true;
        }
        self.forwarding_target(selector).is_some()
    }

    fn responds_natively(&self, selector: &str) -> bool {
        self.parent()
            .is_some_and(|parent| introspect::responds_to(&*parent, selector))
    }

    /// First component implementing `selector`. `None` tells the caller to
    /// fall back to invocation forwarding.
    pub fn forwarding_target(&self, selector: &str) -> Option<Arc<dyn Object>> {
        if !self.is_forwarding() {
            return None;
        }
        self.registry
            .first_responder(selector, self.options.uses_cache())
    }

    /// Signature of `selector`: the facade's own, else the first implementing
    /// component's.
    pub fn method_signature(&self, selector: &str) -> Result<Signature, CompositeError> {
        if let Some(parent) = self.parent() {
            if let Some(method) = introspect::find_method(&*parent, selector) {
                return Ok(method.signature().clone());
            }
        }
        if self.is_forwarding() {
            let resolution = self.registry.resolve(selector, self.options.uses_cache());
            if let Some(signature) = resolution.signature {
                return Ok(signature);
            }
        }
        Err(CompositeError::not_recognized(selector))
    }

    /// Forward `invocation` to every implementing component, in registration
    /// order.
    ///
    /// With one responder its result is returned unchanged. With several, the
    /// call is replayed on each and the last responder's result is kept. The
    /// first component failure stops the replay and is returned as is.
    pub fn forward_invocation(&self, invocation: &mut Invocation) -> Result<(), CompositeError> {
        let selector = invocation.selector().clone();
        if !self.is_forwarding() {
            return Err(CompositeError::not_recognized(selector));
        }

        let resolution = self
            .registry
            .resolve(selector.as_str(), self.options.uses_cache());
        match resolution.components.as_slice() {
            [] => {
                trace!(selector = %selector, "no component implements selector");
                Err(CompositeError::not_recognized(selector))
            }
            [single] => {
                trace!(selector = %selector, "forwarding to single responder");
                let value = invoke_on(&**single, selector.as_str(), invocation.args())?;
                invocation.set_return_value(value);
                Ok(())
            }
            responders => {
                trace!(
                    selector = %selector,
                    responders = responders.len(),
                    "broadcasting to every responder"
                );
                for component in responders {
                    let value = invoke_on(&**component, selector.as_str(), invocation.args())?;
                    invocation.set_return_value(value);
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // Message send
    // =========================================================================

    /// Send `selector` to the facade: native implementation first, then the
    /// first responding component, then invocation forwarding.
    pub fn send(&self, selector: &str, args: &[Val]) -> Result<Val, CompositeError> {
        if let Some(parent) = self.parent() {
            if let Some(method) = introspect::find_method(&*parent, selector) {
                trace!(selector = selector, route = "native", "dispatch");
                return method.invoke(args);
            }
        }

        if let Some(target) = self.forwarding_target(selector) {
            trace!(selector = selector, route = "target", "dispatch");
            return invoke_on(&*target, selector, args);
        }

        trace!(selector = selector, route = "invocation", "dispatch");
        self.invoke_forwarded(selector, args)
    }

    /// Send `selector` to every implementing component and return the last
    /// result. Operations the facade implements itself are not broadcast.
    pub fn broadcast(&self, selector: &str, args: &[Val]) -> Result<Val, CompositeError> {
        if let Some(parent) = self.parent() {
            if let Some(method) = introspect::find_method(&*parent, selector) {
                return method.invoke(args);
            }
        }
        self.invoke_forwarded(selector, args)
    }

    fn invoke_forwarded(&self, selector: &str, args: &[Val]) -> Result<Val, CompositeError> {
        let signature = self.method_signature(selector)?;
        let mut invocation = Invocation::new(selector, signature, args.to_vec());
        self.forward_invocation(&mut invocation)?;
        Ok(invocation.into_return_value())
    }
}

fn invoke_on(component: &dyn Object, selector: &str, args: &[Val]) -> Result<Val, CompositeError> {
    introspect::find_method(component, selector)
        .ok_or_else(|| CompositeError::not_recognized(selector))?
        .invoke(args)
}

impl fmt::Debug for CompositeForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeForwarder")
            .field("options", &self.options)
            .field("class", &self.class.as_ref().map(|c| c.installed().name()))
            .field("forwarding", &self.is_forwarding())
            .field("registry", &self.registry)
            .finish()
    }
}
