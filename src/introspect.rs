//! Method introspection over an object's type hierarchy.
//!
//! The walk starts at the most-derived level of an object and follows
//! [`Object::base`] upward. At each level the operations of that level's
//! [`TypeDescriptor`] are produced in declaration order. Nothing is computed
//! until the iterator is advanced.

use std::sync::Arc;

use tracing::warn;

use crate::descriptor::{MethodEntry, MethodHandle, TypeDescriptor, TypeKey};
use crate::error::CompositeError;
use crate::object::Object;
use crate::value::{Selector, Signature, Val};

/// One operation found during a walk, bound to the level that declares it.
#[derive(Clone, Copy)]
pub struct MethodRef<'a> {
    declaring: &'a Arc<TypeDescriptor>,
    receiver: &'a dyn Object,
    entry: &'a MethodEntry,
    depth: usize,
}

impl<'a> MethodRef<'a> {
    pub fn declaring_type(&self) -> &'a Arc<TypeDescriptor> {
        self.declaring
    }

    pub fn name(&self) -> &'a Selector {
        self.entry.name()
    }

    pub fn signature(&self) -> &'a Signature {
        self.entry.signature()
    }

    pub fn handle(&self) -> &'a MethodHandle {
        self.entry.handle()
    }

    /// Distance from the most-derived level (0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn invoke(&self, args: &[Val]) -> Result<Val, CompositeError> {
        self.entry.handle().call(self.receiver.as_any(), args)
    }
}

impl std::fmt::Debug for MethodRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRef")
            .field("declaring", &self.declaring.name())
            .field("name", self.entry.name())
            .field("signature", self.entry.signature())
            .field("depth", &self.depth)
            .finish()
    }
}

/// Levels of an object's hierarchy, most-derived first.
pub struct Ancestors<'a> {
    next: Option<&'a dyn Object>,
    depth: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    /// (level object, its descriptor, depth)
    type Item = (&'a dyn Object, &'a Arc<TypeDescriptor>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let level = self.next?;
        let depth = self.depth;
        self.next = level.base();
        self.depth += 1;
        Some((level, level.descriptor(), depth))
    }
}

/// Walk the levels of `object`'s hierarchy.
pub fn ancestors(object: &dyn Object) -> Ancestors<'_> {
    Ancestors {
        next: Some(object),
        depth: 0,
    }
}

/// Lazy sequence of every operation reachable on an object.
pub struct Methods<'a> {
    levels: Ancestors<'a>,
    current: Option<(&'a dyn Object, &'a Arc<TypeDescriptor>, usize)>,
    index: usize,
    stop_at: Option<TypeKey>,
}

impl<'a> Methods<'a> {
    fn advance_level(&mut self) -> bool {
        loop {
            let Some((level, ty, depth)) = self.levels.next() else {
                self.current = None;
                return false;
            };
            if self.stop_at == Some(ty.key()) {
                self.current = None;
                // Nothing above the boundary is produced either.
                self.levels.next = None;
                return false;
            }
            if !ty.describes(level.as_any()) {
                warn!(
                    type_name = ty.name(),
                    depth = depth,
                    "descriptor does not describe its receiver, skipping level"
                );
                continue;
            }
            self.current = Some((level, ty, depth));
            self.index = 0;
            return true;
        }
    }
}

impl<'a> Iterator for Methods<'a> {
    type Item = MethodRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((level, ty, depth)) = self.current {
                if let Some(entry) = ty.methods().get(self.index) {
                    self.index += 1;
                    return Some(MethodRef {
                        declaring: ty,
                        receiver: level,
                        entry,
                        depth,
                    });
                }
            }
            if !self.advance_level() {
                return None;
            }
        }
    }
}

/// Every operation reachable on `object`, walking to the root.
pub fn methods(object: &dyn Object) -> Methods<'_> {
    methods_until(object, None)
}

/// Every operation reachable on `object`, stopping before the level whose
/// type is `stop_at`. An unreachable boundary walks to the root.
pub fn methods_until(object: &dyn Object, stop_at: Option<TypeKey>) -> Methods<'_> {
    Methods {
        levels: ancestors(object),
        current: None,
        index: 0,
        stop_at,
    }
}

/// Most-derived implementation of `name` on `object`.
pub fn find_method<'a>(object: &'a dyn Object, name: &str) -> Option<MethodRef<'a>> {
    let mut levels = ancestors(object);
    levels.find_map(|(level, ty, depth)| {
        if !ty.describes(level.as_any()) {
            return None;
        }
        ty.method(name).map(|entry| MethodRef {
            declaring: ty,
            receiver: level,
            entry,
            depth,
        })
    })
}

pub fn responds_to(object: &dyn Object, name: &str) -> bool {
    find_method(object, name).is_some()
}

/// Whether any level of `object` is, or declares as supertype, `key`.
pub fn is_kind_of(object: &dyn Object, key: TypeKey) -> bool {
    ancestors(object).any(|(_, ty, _)| ty.is_subtype_of(key))
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::OnceLock;

    use super::*;
    use crate::value::ValType;

    struct Shape;

    struct Square {
        base: Shape,
        side: i64,
    }

    fn shape_type() -> &'static Arc<TypeDescriptor> {
        static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        TY.get_or_init(|| {
            TypeDescriptor::builder::<Shape>("Shape")
                .method("sides", Signature::returning(ValType::S64), |_: &Shape, _| {
                    Ok(Val::S64(0))
                })
                .method("describe", Signature::returning(ValType::String), |_: &Shape, _| {
                    Ok(Val::String("shape".into()))
                })
                .build()
        })
    }

    fn square_type() -> &'static Arc<TypeDescriptor> {
        static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        TY.get_or_init(|| {
            TypeDescriptor::builder::<Square>("Square")
                .method("sides", Signature::returning(ValType::S64), |_: &Square, _| {
                    Ok(Val::S64(4))
                })
                .method("area", Signature::returning(ValType::S64), |this: &Square, _| {
                    Ok(Val::S64(this.side * this.side))
                })
                .build()
        })
    }

    impl Object for Shape {
        fn descriptor(&self) -> &Arc<TypeDescriptor> {
            shape_type()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Object for Square {
        fn descriptor(&self) -> &Arc<TypeDescriptor> {
            square_type()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn base(&self) -> Option<&dyn Object> {
            Some(&self.base)
        }
    }

    fn square() -> Square {
        Square { base: Shape, side: 3 }
    }

    #[test]
    fn test_walk_most_derived_first() {
        let sq = square();
        let found: Vec<_> = methods(&sq)
            .map(|m| (m.declaring_type().name().to_string(), m.name().to_string()))
            .collect();
        assert_eq!(
            found,
            [
                ("Square".to_string(), "sides".to_string()),
                ("Square".to_string(), "area".to_string()),
                ("Shape".to_string(), "sides".to_string()),
                ("Shape".to_string(), "describe".to_string()),
            ]
        );
    }

    #[test]
    fn test_stop_boundary_is_exclusive() {
        let sq = square();
        let names: Vec<_> = methods_until(&sq, Some(shape_type().key()))
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, ["sides", "area"]);

        // Stopping at the most-derived type yields nothing.
        assert_eq!(methods_until(&sq, Some(square_type().key())).count(), 0);
    }

    #[test]
    fn test_unreachable_boundary_walks_to_root() {
        let shape = Shape;
        assert_eq!(methods_until(&shape, Some(square_type().key())).count(), 2);
    }

    #[test]
    fn test_find_method_prefers_override() {
        let sq = square();
        let sides = find_method(&sq, "sides").unwrap();
        assert_eq!(sides.depth(), 0);
        assert_eq!(sides.invoke(&[]).unwrap(), Val::S64(4));

        let describe = find_method(&sq, "describe").unwrap();
        assert_eq!(describe.depth(), 1);
        assert_eq!(describe.invoke(&[]).unwrap(), Val::String("shape".into()));

        assert_eq!(find_method(&sq, "area").unwrap().invoke(&[]).unwrap(), Val::S64(9));
        assert!(find_method(&sq, "volume").is_none());
    }

    #[test]
    fn test_is_kind_of() {
        let sq = square();
        assert!(is_kind_of(&sq, square_type().key()));
        assert!(is_kind_of(&sq, shape_type().key()));
        assert!(!is_kind_of(&Shape, square_type().key()));
    }

    #[test]
    fn test_ancestors_depths() {
        let sq = square();
        let levels: Vec<_> = ancestors(&sq).map(|(_, ty, depth)| (ty.name(), depth)).collect();
        assert_eq!(levels, [("Square", 0), ("Shape", 1)]);
    }
}
