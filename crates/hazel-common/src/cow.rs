//! Copy-on-write boxes for shared nested structure.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A shared immutable handle with uniqueness-aware mutation.
///
/// Cloning a `CowBox` shares the underlying allocation. `make_mut` returns a
/// mutable reference, cloning the payload first if the handle is shared, so
/// mutation through one handle is never visible through another.
pub struct CowBox<T>(Arc<T>);

impl<T> CowBox<T> {
    pub fn new(value: T) -> CowBox<T> {
        CowBox(Arc::new(value))
    }
}

impl<T: Clone> CowBox<T> {
    /// Mutable access to the payload, cloning it if the handle is shared.
    pub fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.0)
    }

    /// Take the payload out, cloning only if the handle is shared.
    pub fn into_inner(self) -> T {
        Arc::try_unwrap(self.0).unwrap_or_else(|arc| (*arc).clone())
    }
}

impl<T> Clone for CowBox<T> {
    fn clone(&self) -> CowBox<T> {
        CowBox(Arc::clone(&self.0))
    }
}

impl<T> Deref for CowBox<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: PartialEq> PartialEq for CowBox<T> {
    fn eq(&self, other: &CowBox<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl<T: Eq> Eq for CowBox<T> {}

impl<T: fmt::Debug> fmt::Debug for CowBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
