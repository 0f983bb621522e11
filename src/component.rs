use std::sync::{Arc, Weak};

use crate::composite::Composite;

/// State a component embeds to reach the composite it was made for.
///
/// The reference is weak: a component never keeps its composite alive.
#[derive(Clone, Default)]
pub struct ComponentBase {
    composite: Option<Weak<dyn Composite>>,
}

impl ComponentBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_composite<C: Composite>(composite: &Arc<C>) -> Self {
        let composite: Weak<C> = Arc::downgrade(composite);
        Self {
            composite: Some(composite as Weak<dyn Composite>),
        }
    }

    /// The composite, or `None` if there never was one or it has been dropped.
    pub fn composite(&self) -> Option<Arc<dyn Composite>> {
        self.composite.as_ref().and_then(Weak::upgrade)
    }
}

impl std::fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBase")
            .field("attached", &self.composite().is_some())
            .finish()
    }
}
