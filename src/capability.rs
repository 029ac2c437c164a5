//! Optional platform capabilities resolved once at startup.
//!
//! Speech recognition, local synthesis and audio output may all be missing
//! from the execution environment.  Rather than probing for them on every
//! use, `main` resolves each one into a [`Capability`] and injects it; the
//! rest of the crate only matches on the variant.

/// A collaborator that may or may not exist in this environment.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    /// The capability was found and is ready to use.
    Available(T),
    /// The capability is absent; the dependent feature degrades.
    Unavailable,
}

impl<T> Capability<T> {
    /// Returns `true` for [`Capability::Available`].
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    /// Transform the inner handle, keeping `Unavailable` as is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Capability::Available(inner) => Capability::Available(f(inner)),
            Capability::Unavailable => Capability::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Capability<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => Capability::Available(inner),
            None => Capability::Unavailable,
        }
    }
}

impl<T> Default for Capability<T> {
    fn default() -> Self {
        Capability::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_option_maps_variants() {
        assert!(Capability::from(Some(3)).is_available());
        assert!(!Capability::<u8>::from(None).is_available());
    }

    #[test]
    fn map_preserves_unavailable() {
        let absent: Capability<u8> = Capability::Unavailable;
        assert!(matches!(absent.map(|v| v * 2), Capability::Unavailable));

        let present = Capability::Available(4).map(|v| v * 2);
        assert!(matches!(present, Capability::Available(8)));
    }
}
