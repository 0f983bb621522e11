use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::descriptor::TypeDescriptor;

/// An object whose operations can be discovered and invoked by name.
///
/// The type hierarchy is expressed by embedding: an object returns the
/// ancestor it embeds from [`Object::base`], and that ancestor describes
/// itself in turn. The walk ends at the object whose `base` is `None`.
///
/// ```ignore
/// impl Object for Counter {
///     fn descriptor(&self) -> &Arc<TypeDescriptor> { counter_type() }
///     fn as_any(&self) -> &dyn Any { self }
/// }
/// ```
pub trait Object: Any + Send + Sync {
    /// Descriptor of the most-derived type of this object.
    fn descriptor(&self) -> &Arc<TypeDescriptor>;

    /// Receiver passed to this level's operation handles.
    fn as_any(&self) -> &dyn Any;

    /// Embedded ancestor, one level up the hierarchy.
    fn base(&self) -> Option<&dyn Object> {
        None
    }
}

/// Identity of an object: its address together with its concrete type.
///
/// An embedded ancestor can share its outer object's address, so the
/// address alone does not tell them apart.
///
/// Only meaningful while something keeps the allocation alive; registries
/// hold a `Weak` next to every id they store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    addr: usize,
    ty: TypeId,
}

impl ObjectId {
    pub fn of(object: &dyn Object) -> Self {
        Self {
            addr: object as *const dyn Object as *const () as usize,
            ty: <dyn Object as Any>::type_id(object),
        }
    }

    pub fn of_arc(object: &Arc<dyn Object>) -> Self {
        Self::of(&**object)
    }
}
