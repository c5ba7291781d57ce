//! Non-owning resource handles.

use std::fmt;
use std::sync::{Arc, Weak};

/// A weak reference to a stored resource.
///
/// Holding a `ResourceRef` does not keep the resource alive; once the store
/// drops or replaces it, [`ResourceRef::resolve`] returns `None`.
pub struct ResourceRef<T> {
    inner: Weak<T>,
}

impl<T> ResourceRef<T> {
    /// A handle that never resolves.
    pub fn empty() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn new(resource: &Arc<T>) -> Self {
        Self {
            inner: Arc::downgrade(resource),
        }
    }

    pub fn resolve(&self) -> Option<Arc<T>> {
        self.inner.upgrade()
    }

    pub fn is_resolvable(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Clone for ResourceRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> Default for ResourceRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for ResourceRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("resolvable", &self.is_resolvable())
            .finish()
    }
}

impl<T> From<&Arc<T>> for ResourceRef<T> {
    fn from(resource: &Arc<T>) -> Self {
        Self::new(resource)
    }
}
