use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::descriptor::TypeDescriptor;
use crate::error::CompositeError;
use crate::object::Object;

use super::forwarder::CompositeForwarder;
use super::installer::{ClassRegistry, InstalledClass};
use super::options::ForwarderOptions;
use super::Composite;

/// Decorator that makes any `Object` composite.
///
/// While forwarding through a synthesized type (`CREATE_CLASS`) the decorator
/// reports that type and exposes the wrapped object as its base. Otherwise it
/// is transparent: type, receiver and hierarchy are the wrapped object's.
pub struct Composed<T: Object> {
    inner: T,
    forwarder: CompositeForwarder,
}

impl<T: Object> Composed<T> {
    /// Wrap `inner`, installing through the process-wide class registry when
    /// `options` ask for type-level forwarding.
    pub fn new(options: ForwarderOptions, inner: T) -> Result<Arc<Self>, CompositeError> {
        Self::in_registry(ClassRegistry::global(), options, inner)
    }

    pub fn in_registry(
        classes: &ClassRegistry,
        options: ForwarderOptions,
        inner: T,
    ) -> Result<Arc<Self>, CompositeError> {
        let class = classes.ensure_installed(options, inner.descriptor())?;
        Ok(Self::with_class(options, class, inner))
    }

    fn with_class(
        options: ForwarderOptions,
        class: Option<Arc<InstalledClass>>,
        inner: T,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let parent: Weak<dyn Object> = this.clone();
            Self {
                inner,
                forwarder: CompositeForwarder::from_parts(options, class, parent),
            }
        })
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// See [`CompositeForwarder::revert_class`].
    pub fn revert_class(&self) -> bool {
        self.forwarder.revert_class()
    }

    /// See [`CompositeForwarder::migrate_class`].
    pub fn migrate_class(&self) -> bool {
        self.forwarder.migrate_class()
    }
}

impl<T: Object> Object for Composed<T> {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        match self.forwarder.migrated_type() {
            Some(installed) => installed,
            None => self.inner.descriptor(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        match self.forwarder.migrated_type() {
            Some(_) => self,
            None => self.inner.as_any(),
        }
    }

    fn base(&self) -> Option<&dyn Object> {
        match self.forwarder.migrated_type() {
            Some(_) => Some(&self.inner),
            None => self.inner.base(),
        }
    }
}

impl<T: Object> Composite for Composed<T> {
    fn forwarder(&self) -> &CompositeForwarder {
        &self.forwarder
    }
}

/// Factory for composite instances of one facade type.
///
/// With `MODIFY_CLASS` or `CREATE_CLASS` every instance it builds shares the
/// installed type's components, and components can be attached here at the
/// type level. Without either flag each instance gets its own registry and
/// the type-level operations do nothing.
pub struct CompositeClass<T> {
    options: ForwarderOptions,
    facade_type: Arc<TypeDescriptor>,
    class: Option<Arc<InstalledClass>>,
    _instances: PhantomData<fn() -> T>,
}

impl<T: Object> CompositeClass<T> {
    pub fn install(
        options: ForwarderOptions,
        facade_type: &Arc<TypeDescriptor>,
    ) -> Result<Self, CompositeError> {
        Self::install_in(ClassRegistry::global(), options, facade_type)
    }

    pub fn install_in(
        classes: &ClassRegistry,
        options: ForwarderOptions,
        facade_type: &Arc<TypeDescriptor>,
    ) -> Result<Self, CompositeError> {
        let class = classes.ensure_installed(options, facade_type)?;
        Ok(Self {
            options,
            facade_type: facade_type.clone(),
            class,
            _instances: PhantomData,
        })
    }

    pub fn options(&self) -> ForwarderOptions {
        self.options
    }

    pub fn facade_type(&self) -> &Arc<TypeDescriptor> {
        &self.facade_type
    }

    pub fn installed_class(&self) -> Option<&Arc<InstalledClass>> {
        self.class.as_ref()
    }

    /// Build a composite instance around `inner`.
    pub fn instantiate(&self, inner: T) -> Arc<Composed<T>> {
        if inner.descriptor().key() != self.facade_type.key() {
            warn!(
                expected = self.facade_type.name(),
                actual = inner.descriptor().name(),
                "instantiating composite class with an object of another type"
            );
        }
        Composed::with_class(self.options, self.class.clone(), inner)
    }

    /// Attach `component` to every instance of the installed type.
    pub fn add_component(&self, component: Arc<dyn Object>) {
        let Some(class) = &self.class else {
            debug!(type_name = self.facade_type.name(), "type-level add on uninstalled class");
            return;
        };
        let no_composite: Weak<dyn Object> = Weak::<Composed<T>>::new();
        class.registry().add(component, no_composite);
    }

    pub fn remove_component(&self, component: &dyn Object) {
        let Some(class) = &self.class else {
            debug!(type_name = self.facade_type.name(), "type-level remove on uninstalled class");
            return;
        };
        class.registry().remove(component);
    }

    pub fn component_count(&self) -> usize {
        self.class.as_ref().map_or(0, |class| class.registry().count())
    }

    pub fn components_implementing_selector(&self, selector: &str) -> Vec<Arc<dyn Object>> {
        match &self.class {
            Some(class) => {
                class
                    .registry()
                    .resolve(selector, self.options.uses_cache())
                    .components
            }
            None => Vec::new(),
        }
    }
}
