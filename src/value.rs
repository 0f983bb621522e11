use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Name of an operation a composite or component may answer.
///
/// Cloning is a reference-count bump, so selectors are passed by value freely.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(Arc<str>);

impl Selector {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({:?})", &*self.0)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Selector> for Selector {
    fn from(selector: &Selector) -> Self {
        selector.clone()
    }
}

impl Borrow<str> for Selector {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Selector {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Selector {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// A dynamically typed argument or result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Val {
    #[default]
    Unit,
    Bool(bool),
    S32(i32),
    S64(i64),
    F64(f64),
    String(String),
    List(Vec<Val>),
}

impl Val {
    pub fn ty(&self) -> ValType {
        match self {
            Val::Unit => ValType::Unit,
            Val::Bool(_) => ValType::Bool,
            Val::S32(_) => ValType::S32,
            Val::S64(_) => ValType::S64,
            Val::F64(_) => ValType::F64,
            Val::String(_) => ValType::String,
            // Element type of a list is whatever its first element is;
            // an empty list matches any list type.
            Val::List(items) => ValType::List(Box::new(
                items.first().map(Val::ty).unwrap_or(ValType::Any),
            )),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Val::Unit)
    }
}

/// Static type of a [`Val`] as declared in a [`Signature`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValType {
    /// Matches any value.
    Any,
    Unit,
    Bool,
    S32,
    S64,
    F64,
    String,
    List(Box<ValType>),
}

impl ValType {
    /// Whether a value of type `actual` may be passed where `self` is declared.
    pub fn admits(&self, actual: &ValType) -> bool {
        match (self, actual) {
            (ValType::Any, _) | (_, ValType::Any) => true,
            (ValType::List(expected), ValType::List(actual)) => expected.admits(actual),
            (expected, actual) => expected == actual,
        }
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValType::Any => f.write_str("any"),
            ValType::Unit => f.write_str("unit"),
            ValType::Bool => f.write_str("bool"),
            ValType::S32 => f.write_str("s32"),
            ValType::S64 => f.write_str("s64"),
            ValType::F64 => f.write_str("f64"),
            ValType::String => f.write_str("string"),
            ValType::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

/// Parameter and result types of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<ValType>,
    result: ValType,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = ValType>, result: ValType) -> Self {
        Self {
            params: params.into_iter().collect(),
            result,
        }
    }

    /// `() -> unit`
    pub fn unit() -> Self {
        Self::new([], ValType::Unit)
    }

    /// `() -> result`
    pub fn returning(result: ValType) -> Self {
        Self::new([], result)
    }

    pub fn params(&self) -> &[ValType] {
        &self.params
    }

    pub fn result(&self) -> &ValType {
        &self.result
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check arity and parameter types of `args` against this signature.
    pub fn accepts(&self, args: &[Val]) -> bool {
        args.len() == self.params.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(expected, arg)| expected.admits(&arg.ty()))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.result)
    }
}
