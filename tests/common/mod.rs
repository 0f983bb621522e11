#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use composite_forwarder::{
    ComponentBase, CompositeError, Object, Signature, TypeDescriptor, Val, ValType,
};

macro_rules! described {
    ($ty:ty, $describe:expr) => {
        impl Object for $ty {
            fn descriptor(&self) -> &Arc<TypeDescriptor> {
                static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
                TY.get_or_init($describe)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// Answers `foo` with 1.
#[derive(Default)]
pub struct A {
    pub calls: AtomicUsize,
}

described!(A, || {
    TypeDescriptor::builder::<A>("A")
        .method("foo", Signature::returning(ValType::S32), |this: &A, _| {
            this.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Val::S32(1))
        })
        .build()
});

/// Answers `foo` with 2 and `bar` with 3.
#[derive(Default)]
pub struct B {
    pub calls: AtomicUsize,
}

described!(B, || {
    TypeDescriptor::builder::<B>("B")
        .method("foo", Signature::returning(ValType::S32), |this: &B, _| {
            this.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Val::S32(2))
        })
        .method("bar", Signature::returning(ValType::S32), |_: &B, _| Ok(Val::S32(3)))
        .build()
});

/// Returns its single argument unchanged.
pub struct Echo;

described!(Echo, || {
    TypeDescriptor::builder::<Echo>("Echo")
        .method(
            "echo",
            Signature::new([ValType::Any], ValType::Any),
            |_: &Echo, args| Ok(args.first().cloned().unwrap_or_default()),
        )
        .build()
});

#[derive(Debug)]
pub struct Broken;

impl std::fmt::Display for Broken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("component broke")
    }
}

impl std::error::Error for Broken {}

/// `fail` always fails with its own error.
pub struct Failing;

described!(Failing, || {
    TypeDescriptor::builder::<Failing>("Failing")
        .method("fail", Signature::unit(), |_: &Failing, _| {
            Err(CompositeError::component(Broken))
        })
        .build()
});

/// Facade with native `ping` and `foo`.
pub struct Host {
    pub name: String,
}

impl Host {
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    pub fn descriptor_static() -> &'static Arc<TypeDescriptor> {
        static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        TY.get_or_init(|| {
            TypeDescriptor::builder::<Host>("Host")
                .method("ping", Signature::returning(ValType::String), |this: &Host, _| {
                    Ok(Val::String(format!("pong from {}", this.name)))
                })
                .method("foo", Signature::returning(ValType::S32), |_: &Host, _| {
                    Ok(Val::S32(100))
                })
                .build()
        })
    }
}

impl Object for Host {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        Host::descriptor_static()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Facade that declares nothing.
pub struct Plain;

impl Plain {
    pub fn descriptor_static() -> &'static Arc<TypeDescriptor> {
        static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        TY.get_or_init(|| TypeDescriptor::builder::<Plain>("Plain").build())
    }
}

impl Object for Plain {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        Plain::descriptor_static()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Component that answers `relay` by sending `ping` back to its composite.
pub struct Relay {
    pub base: ComponentBase,
}

described!(Relay, || {
    TypeDescriptor::builder::<Relay>("Relay")
        .method("relay", Signature::returning(ValType::Any), |this: &Relay, _| {
            match this.base.composite() {
                Some(composite) => composite.send("ping", &[]),
                None => Ok(Val::Unit),
            }
        })
        .build()
});

pub fn obj<T: Object>(value: T) -> Arc<dyn Object> {
    Arc::new(value)
}

/// Route library logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Answers `reading` with its stored value.
pub struct Gauge {
    pub value: i64,
}

described!(Gauge, || {
    TypeDescriptor::builder::<Gauge>("Gauge")
        .method("reading", Signature::returning(ValType::S64), |this: &Gauge, _| {
            Ok(Val::S64(this.value))
        })
        .build()
});

/// Embeds a `Gauge` as its base and declares `label` itself. `reading` is
/// only reachable through the base.
pub struct Dial {
    pub base: Gauge,
    pub ticks: i8,
}

impl Object for Dial {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        TY.get_or_init(|| {
            TypeDescriptor::builder::<Dial>("Dial")
                .method("label", Signature::returning(ValType::String), |this: &Dial, _| {
                    Ok(Val::String(format!("dial/{}", this.ticks)))
                })
                .build()
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }
}

/// Claims A's descriptor at its own level, which A's handles cannot run on,
/// and embeds a real B below it.
pub struct Mislabeled {
    pub base: B,
}

impl Object for Mislabeled {
    fn descriptor(&self) -> &Arc<TypeDescriptor> {
        static TY: OnceLock<Arc<TypeDescriptor>> = OnceLock::new();
        TY.get_or_init(|| A::default().descriptor().clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }
}
