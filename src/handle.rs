//! Owned wrappers around opaque native pointers.
//!
//! Every native object this crate touches is held through [`Handle`], which
//! pairs one non-null pointer with its release contract. A handle is either
//! valid or in a released terminal state; the pointer is never dereferenced
//! after release, and release runs exactly once.

use std::ptr::NonNull;

use crate::error::{GeobindError, Result};

/// Release contract for one opaque native type.
///
/// Implementations must tolerate being called during teardown: failures
/// reported by the engine while freeing are swallowed, since drop order
/// relative to other owners is not guaranteed.
pub(crate) trait NativeFree {
    /// # Safety
    /// `ptr` must be a live pointer previously returned by the native engine
    /// and not owned by any other wrapper.
    unsafe fn free(ptr: NonNull<Self>);
}

/// An owned native pointer with deterministic, idempotent release.
pub(crate) struct Handle<T: NativeFree> {
    ptr: Option<NonNull<T>>,
}

impl<T: NativeFree> Handle<T> {
    /// Wrap a pointer returned by a native factory. Returns `None` on null so
    /// callers can surface the construction error appropriate to their
    /// operation.
    pub(crate) fn new(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Handle { ptr: Some(ptr) })
    }

    /// A handle already in the released state. Every access reports
    /// [`GeobindError::NullHandle`].
    pub(crate) fn released() -> Self {
        Handle { ptr: None }
    }

    /// The wrapped pointer, or [`GeobindError::NullHandle`] once released.
    pub(crate) fn get(&self) -> Result<NonNull<T>> {
        self.ptr.ok_or(GeobindError::NullHandle)
    }

    /// Transfer ownership of the raw pointer out, leaving this handle in the
    /// released state. Used where a native constructor consumes its argument.
    pub(crate) fn take(&mut self) -> Result<NonNull<T>> {
        self.ptr.take().ok_or(GeobindError::NullHandle)
    }

    /// Replace the wrapped pointer, releasing the previous one after the
    /// swap. This is the commit step of rebuild-style mutation: the old
    /// native object stays live until its replacement exists.
    pub(crate) fn swap(&mut self, ptr: NonNull<T>) {
        let prev = self.ptr.replace(ptr);
        if let Some(prev) = prev {
            unsafe { T::free(prev) };
        }
    }
}

impl<T: NativeFree> Drop for Handle<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            unsafe { T::free(ptr) };
        }
    }
}
