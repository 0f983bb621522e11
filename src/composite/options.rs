use crate::error::CompositeError;

bitflags::bitflags! {
    /// How a forwarder is installed and whether it memoizes resolution.
    ///
    /// Bit values are fixed; masks stored as integers keep their meaning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ForwarderOptions: u32 {
        /// Install forwarding onto the facade type itself. Irreversible.
        const MODIFY_CLASS = 1 << 1;
        /// Memoize which components implement each selector.
        const USE_CACHE = 1 << 2;
        /// Synthesize a forwarding subtype and migrate instances to it.
        const CREATE_CLASS = 1 << 3;
    }
}

impl ForwarderOptions {
    pub const NONE: Self = Self::empty();

    /// Reject contradictory combinations.
    pub fn validate(self) -> Result<Self, CompositeError> {
        if self.contains(Self::MODIFY_CLASS | Self::CREATE_CLASS) {
            return Err(CompositeError::ClassMutationConflict);
        }
        Ok(self)
    }

    #[inline]
    pub fn uses_cache(self) -> bool {
        self.contains(Self::USE_CACHE)
    }

    /// Whether forwarding state is shared by the whole facade type.
    #[inline]
    pub fn installs_class(self) -> bool {
        self.intersects(Self::MODIFY_CLASS | Self::CREATE_CLASS)
    }
}
