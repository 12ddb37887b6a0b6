//! Handles for data that is loaded after startup.
//!
//! Meshes, clips and skeletons arrive asynchronously. Consumers match on the
//! handle every tick and skip their work while it is not `Loaded`, so a late
//! asset simply starts being used on the first tick after it lands.

/// Load state of an externally supplied asset.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetHandle<T> {
    /// Requested but not delivered yet.
    Pending,
    /// Available for use.
    Loaded(T),
    /// The loader gave up. Dependent work stays skipped.
    Failed(String),
}

impl<T> Default for AssetHandle<T> {
    fn default() -> Self {
        AssetHandle::Pending
    }
}

impl<T> AssetHandle<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            AssetHandle::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            AssetHandle::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, AssetHandle::Loaded(_))
    }

    /// Deliver the asset. Replaces whatever state the handle was in.
    pub fn complete(&mut self, value: T) {
        *self = AssetHandle::Loaded(value);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Asset load failed: {}", reason);
        *self = AssetHandle::Failed(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_until_completed() {
        let mut handle: AssetHandle<u32> = AssetHandle::default();
        assert!(handle.loaded().is_none());
        handle.complete(7);
        assert_eq!(handle.loaded(), Some(&7));
    }

    #[test]
    fn failed_is_not_loaded() {
        let mut handle: AssetHandle<u32> = AssetHandle::Pending;
        handle.fail("missing file");
        assert!(!handle.is_loaded());
    }
}
