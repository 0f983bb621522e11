//! Compose independent components behind one facade.
//!
//! A facade owns a [`CompositeForwarder`]. Operations the facade declares
//! itself are answered natively; any other operation is forwarded to the
//! attached components that declare it, discovered through each object's
//! [`TypeDescriptor`] hierarchy.
//!
//! - [`introspect`]: walks an object's hierarchy and yields its operations
//! - [`ComponentRegistry`]: ordered, weakly held components of one facade
//! - [`ImplementationCache`]: memoized responder lists, per instance or type
//! - [`CompositeForwarder`]: the interception points and message send
//! - [`ClassRegistry`] / [`CompositeClass`]: type-level installation

pub mod component;
pub mod composite;
pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod object;
pub mod value;

pub use component::ComponentBase;
pub use composite::cache::{CacheEntry, CacheScope, CacheStats, ImplementationCache};
pub use composite::composed::{Composed, CompositeClass};
pub use composite::forwarder::CompositeForwarder;
pub use composite::installer::{ClassRegistry, InstallStrategy, InstalledClass};
pub use composite::invocation::Invocation;
pub use composite::options::ForwarderOptions;
pub use composite::registry::{ComponentEntry, ComponentRegistry, Resolution};
pub use composite::Composite;
pub use descriptor::{MethodEntry, MethodHandle, TypeBuilder, TypeDescriptor, TypeKey};
pub use error::{BoxError, CompositeError};
pub use introspect::MethodRef;
pub use object::{Object, ObjectId};
pub use value::{Selector, Signature, Val, ValType};
