use crate::value::{Selector, Signature, Val};

/// A message captured for forwarding: selector, the signature it was built
/// against, its arguments and a slot for the return value.
///
/// There is no way to build one without a signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    selector: Selector,
    signature: Signature,
    args: Vec<Val>,
    return_value: Val,
}

impl Invocation {
    pub fn new(selector: impl Into<Selector>, signature: Signature, args: Vec<Val>) -> Self {
        Self {
            selector: selector.into(),
            signature,
            args,
            return_value: Val::Unit,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn args(&self) -> &[Val] {
        &self.args
    }

    pub fn return_value(&self) -> &Val {
        &self.return_value
    }

    pub fn set_return_value(&mut self, value: Val) {
        self.return_value = value;
    }

    pub fn into_return_value(self) -> Val {
        self.return_value
    }
}
