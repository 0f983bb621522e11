//! Type-level installation of forwarding.
//!
//! Installing a facade type means every instance built for it shares one
//! [`ComponentRegistry`] (and with it one implementation cache). Installed
//! types live in a [`ClassRegistry`]; most callers use the process-wide
//! [`ClassRegistry::global`], tests usually construct their own.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::descriptor::{TypeDescriptor, TypeKey};
use crate::error::CompositeError;

use super::options::ForwarderOptions;
use super::registry::ComponentRegistry;

/// How a type was made composite-aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStrategy {
    /// The facade type itself forwards. Cannot be undone.
    ModifyClass,
    /// A synthesized subtype forwards; instances migrate to it and may
    /// revert to the original type.
    CreateClass,
}

impl InstallStrategy {
    pub fn from_options(options: ForwarderOptions) -> Result<Option<Self>, CompositeError> {
        let options = options.validate()?;
        if options.contains(ForwarderOptions::MODIFY_CLASS) {
            Ok(Some(Self::ModifyClass))
        } else if options.contains(ForwarderOptions::CREATE_CLASS) {
            Ok(Some(Self::CreateClass))
        } else {
            Ok(None)
        }
    }
}

/// A facade type after installation.
#[derive(Debug)]
pub struct InstalledClass {
    strategy: InstallStrategy,
    original: Arc<TypeDescriptor>,
    installed: Arc<TypeDescriptor>,
    registry: Arc<ComponentRegistry>,
}

impl InstalledClass {
    fn new(strategy: InstallStrategy, original: &Arc<TypeDescriptor>) -> Self {
        let installed = match strategy {
            InstallStrategy::ModifyClass => original.clone(),
            InstallStrategy::CreateClass => {
                TypeDescriptor::subtype_of(original, format!("{}+Composite", original.name()))
            }
        };
        Self {
            strategy,
            original: original.clone(),
            registry: Arc::new(ComponentRegistry::for_type(installed.key())),
            installed,
        }
    }

    pub fn strategy(&self) -> InstallStrategy {
        self.strategy
    }

    /// The facade type as it was before installation.
    pub fn original(&self) -> &Arc<TypeDescriptor> {
        &self.original
    }

    /// The type instances carry while forwarding: the original itself for
    /// `ModifyClass`, the synthesized subtype for `CreateClass`.
    pub fn installed(&self) -> &Arc<TypeDescriptor> {
        &self.installed
    }

    /// Components shared by every instance of the installed type.
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }
}

/// Installed facade types, keyed by original type and strategy.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<(TypeKey, InstallStrategy), Arc<InstalledClass>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static ClassRegistry {
        static GLOBAL: OnceLock<ClassRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ClassRegistry::new)
    }

    /// Install forwarding for `facade_type` as `options` ask. Returns `None`
    /// when `options` request no type-level installation.
    ///
    /// Idempotent: repeated calls for the same type and strategy return the
    /// same installation.
    pub fn ensure_installed(
        &self,
        options: ForwarderOptions,
        facade_type: &Arc<TypeDescriptor>,
    ) -> Result<Option<Arc<InstalledClass>>, CompositeError> {
        let Some(strategy) = InstallStrategy::from_options(options)? else {
            return Ok(None);
        };
        let key = (facade_type.key(), strategy);

        if let Some(class) = self.classes.read().get(&key) {
            return Ok(Some(class.clone()));
        }

        let mut classes = self.classes.write();
        let class = classes.entry(key).or_insert_with(|| {
            let class = Arc::new(InstalledClass::new(strategy, facade_type));
            debug!(
                type_name = facade_type.name(),
                installed = class.installed().name(),
                strategy = ?strategy,
                "installed composite forwarding"
            );
            class
        });
        Ok(Some(class.clone()))
    }

    pub fn get(
        &self,
        facade_type: TypeKey,
        strategy: InstallStrategy,
    ) -> Option<Arc<InstalledClass>> {
        self.classes.read().get(&(facade_type, strategy)).cloned()
    }

    pub fn is_installed(&self, facade_type: TypeKey) -> bool {
        self.classes.read().keys().any(|(key, _)| *key == facade_type)
    }

    /// Original keys of every installed type.
    pub fn installed_types(&self) -> Vec<TypeKey> {
        let mut keys: Vec<_> = self.classes.read().keys().map(|(key, _)| *key).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Forget every installation of `facade_type`. Instances built before
    /// teardown keep the shared state they hold; later instances start fresh.
    pub fn teardown(&self, facade_type: TypeKey) -> bool {
        let mut classes = self.classes.write();
        let before = classes.len();
        classes.retain(|(key, _), _| *key != facade_type);
        let removed = before != classes.len();
        if removed {
            debug!(type_key = facade_type.raw(), "tore down composite forwarding");
        }
        removed
    }

    pub fn clear(&self) {
        self.classes.write().clear();
    }
}
