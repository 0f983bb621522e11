use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::CompositeError;
use crate::value::{Selector, Signature, Val};

/// Global counter for allocating unique type keys.
static NEXT_TYPE_KEY: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

impl TypeKey {
    fn allocate() -> Self {
        Self(NEXT_TYPE_KEY.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

type MethodFn = dyn Fn(&dyn Any, &[Val]) -> Result<Val, CompositeError> + Send + Sync;

/// Type-erased executable handle of one operation.
///
/// Created from a closure typed on the receiver; the receiver is recovered by
/// downcast at call time.
#[derive(Clone)]
pub struct MethodHandle(Arc<MethodFn>);

impl MethodHandle {
    fn new<T, F>(selector: Selector, f: F) -> Self
    where
        T: Any,
        F: Fn(&T, &[Val]) -> Result<Val, CompositeError> + Send + Sync + 'static,
    {
        Self(Arc::new(move |receiver: &dyn Any, args: &[Val]| {
            let this = receiver
                .downcast_ref::<T>()
                .ok_or_else(|| CompositeError::not_recognized(&selector))?;
            f(this, args)
        }))
    }

    pub fn call(&self, receiver: &dyn Any, args: &[Val]) -> Result<Val, CompositeError> {
        (self.0)(receiver, args)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MethodHandle(..)")
    }
}

/// One operation declared by a type.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    name: Selector,
    signature: Signature,
    handle: MethodHandle,
}

impl MethodEntry {
    pub fn name(&self) -> &Selector {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn handle(&self) -> &MethodHandle {
        &self.handle
    }
}

/// Registration-time description of a type: its identity and the operations
/// it answers, in declaration order.
///
/// Descriptors are immutable once built and shared through `Arc`.
pub struct TypeDescriptor {
    key: TypeKey,
    name: String,
    rust_type: Option<TypeId>,
    supertype: Option<Arc<TypeDescriptor>>,
    methods: Vec<MethodEntry>,
    index: HashMap<Selector, usize>,
}

impl TypeDescriptor {
    /// Start describing receiver type `T`.
    pub fn builder<T: Any>(name: impl Into<String>) -> TypeBuilder<T> {
        TypeBuilder {
            name: name.into(),
            methods: Vec::new(),
            _receiver: PhantomData,
        }
    }

    /// Synthesize a subtype of `supertype` that declares no operations of its
    /// own. Every call allocates a fresh key.
    pub fn subtype_of(supertype: &Arc<TypeDescriptor>, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: TypeKey::allocate(),
            name: name.into(),
            rust_type: None,
            supertype: Some(supertype.clone()),
            methods: Vec::new(),
            index: HashMap::new(),
        })
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type the operation handles expect as receiver, if any.
    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    /// Declared supertype, set only on synthesized subtypes.
    pub fn supertype(&self) -> Option<&Arc<TypeDescriptor>> {
        self.supertype.as_ref()
    }

    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.index.get(name).map(|&i| &self.methods[i])
    }

    pub fn declares(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Whether `key` names this type or one of its declared supertypes.
    pub fn is_subtype_of(&self, key: TypeKey) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.key == key {
                return true;
            }
            current = ty.supertype.as_deref();
        }
        false
    }

    /// Whether an object whose `as_any()` is `receiver` may run this type's
    /// operation handles.
    pub(crate) fn describes(&self, receiver: &dyn Any) -> bool {
        self.rust_type
            .map_or(true, |expected| Any::type_id(receiver) == expected)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("supertype", &self.supertype.as_ref().map(|s| s.name()))
            .field(
                "methods",
                &self.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for a [`TypeDescriptor`] whose operations run on `T`.
pub struct TypeBuilder<T> {
    name: String,
    methods: Vec<MethodEntry>,
    _receiver: PhantomData<fn(&T)>,
}

impl<T: Any> TypeBuilder<T> {
    /// Declare an operation. Redeclaring a name replaces the earlier handle
    /// but keeps its position.
    pub fn method<F>(mut self, name: impl Into<Selector>, signature: Signature, f: F) -> Self
    where
        F: Fn(&T, &[Val]) -> Result<Val, CompositeError> + Send + Sync + 'static,
    {
        let name = name.into();
        let entry = MethodEntry {
            handle: MethodHandle::new(name.clone(), f),
            name,
            signature,
        };
        match self.methods.iter_mut().find(|m| m.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.methods.push(entry),
        }
        self
    }

    pub fn build(self) -> Arc<TypeDescriptor> {
        let index = self
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Arc::new(TypeDescriptor {
            key: TypeKey::allocate(),
            name: self.name,
            rust_type: Some(TypeId::of::<T>()),
            supertype: None,
            methods: self.methods,
            index,
        })
    }
}
