pub mod cache;
pub mod composed;
pub mod forwarder;
pub mod installer;
pub mod invocation;
pub mod options;
pub mod registry;

use std::sync::Arc;

use crate::descriptor::TypeKey;
use crate::error::CompositeError;
use crate::object::Object;
use crate::value::{Signature, Val};

use forwarder::CompositeForwarder;

/// An object that answers operations it does not implement by forwarding
/// them to attached components.
///
/// Implementors only provide [`Composite::forwarder`]; every other method
/// delegates to it.
pub trait Composite: Object {
    fn forwarder(&self) -> &CompositeForwarder;

    fn add_component(&self, component: Arc<dyn Object>) {
        self.forwarder().add_component(component)
    }

    fn remove_component(&self, component: &dyn Object) {
        self.forwarder().remove_component(component)
    }

    fn component_implementation_count(&self, selector: &str) -> usize {
        self.forwarder().component_implementation_count(selector)
    }

    fn components_implementing_selector(&self, selector: &str) -> Vec<Arc<dyn Object>> {
        self.forwarder().components_implementing_selector(selector)
    }

    /// Type check: the facade's type, then each component.
    fn is_kind_of_composite(&self, ty: TypeKey) -> bool {
        self.forwarder().is_kind_of(ty)
    }

    /// Responds check: the facade's own operations, then each component.
    fn responds_to_selector_composite(&self, selector: &str) -> bool {
        self.forwarder().responds_to(selector)
    }

    /// Single-target fast path.
    fn forwarding_target_for_selector(&self, selector: &str) -> Option<Arc<dyn Object>> {
        self.forwarder().forwarding_target(selector)
    }

    fn method_signature_for_selector_composite(
        &self,
        selector: &str,
    ) -> Result<Signature, CompositeError> {
        self.forwarder().method_signature(selector)
    }

    /// Full invocation forwarding.
    fn forward_invocation_composite(
        &self,
        invocation: &mut invocation::Invocation,
    ) -> Result<(), CompositeError> {
        self.forwarder().forward_invocation(invocation)
    }

    fn send(&self, selector: &str, args: &[Val]) -> Result<Val, CompositeError> {
        self.forwarder().send(selector, args)
    }

    fn broadcast(&self, selector: &str, args: &[Val]) -> Result<Val, CompositeError> {
        self.forwarder().broadcast(selector, args)
    }
}
