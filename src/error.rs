use thiserror::Error;

use crate::value::Selector;

/// Boxed error raised by a component's own operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("unrecognized selector '{selector}' sent to composite")]
    SelectorNotRecognized { selector: Selector },

    #[error("MODIFY_CLASS and CREATE_CLASS cannot be combined")]
    ClassMutationConflict,

    #[error(transparent)]
    Component(BoxError),
}

impl CompositeError {
    pub fn not_recognized(selector: impl Into<Selector>) -> Self {
        Self::SelectorNotRecognized {
            selector: selector.into(),
        }
    }

    /// Wrap a failure raised inside a component operation.
    pub fn component(error: impl Into<BoxError>) -> Self {
        Self::Component(error.into())
    }

    pub fn is_not_recognized(&self) -> bool {
        matches!(self, Self::SelectorNotRecognized { .. })
    }
}
