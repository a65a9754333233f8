//! Per-thread GEOS engine sessions.
//!
//! GEOS is not reentrant: every `_r` entry point takes a context handle that
//! must not be shared between threads. Each thread lazily initializes exactly
//! one context on its first native call and keeps it until thread exit, so
//! concurrent callers never contend for a session and no locking is needed.
//! Context handles never leave this module; every wrapper type in the crate
//! holds raw pointers and is therefore neither `Send` nor `Sync`.

use std::cell::RefCell;
use std::ffi::CStr;

use geos_sys::{
    GEOSContextHandle_t, GEOSContext_setErrorMessageHandler_r,
    GEOSContext_setNoticeMessageHandler_r, GEOS_finish_r, GEOS_init_r,
};
use libc::{c_char, c_void};

use crate::error::{GeobindError, Result};

thread_local! {
    static CONTEXT: RefCell<Option<ThreadContext>> = const { RefCell::new(None) };
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[cfg(test)]
thread_local! {
    pub(crate) static SESSIONS_CREATED: std::cell::Cell<usize> =
        const { std::cell::Cell::new(0) };
}

/// One initialized GEOS session, owned by the thread that created it and
/// finished at thread exit when the thread-local slot is dropped.
struct ThreadContext {
    handle: GEOSContextHandle_t,
}

impl ThreadContext {
    fn new() -> Result<Self> {
        let handle = unsafe { GEOS_init_r() };
        if handle.is_null() {
            return Err(GeobindError::EngineInitialization(
                "GEOS_init_r returned null".to_string(),
            ));
        }
        unsafe {
            GEOSContext_setErrorMessageHandler_r(handle, Some(error_handler), std::ptr::null_mut());
            GEOSContext_setNoticeMessageHandler_r(
                handle,
                Some(notice_handler),
                std::ptr::null_mut(),
            );
        }
        #[cfg(test)]
        SESSIONS_CREATED.with(|count| count.set(count.get() + 1));
        Ok(ThreadContext { handle })
    }
}

impl Drop for ThreadContext {
    fn drop(&mut self) {
        unsafe { GEOS_finish_r(self.handle) };
    }
}

/// GEOS reports failures through this callback before returning its error
/// sentinel; the message is kept so the failing call can surface it.
unsafe extern "C" fn error_handler(message: *const c_char, _userdata: *mut c_void) {
    if message.is_null() {
        return;
    }
    let text = CStr::from_ptr(message).to_string_lossy().into_owned();
    let _ = LAST_ERROR.try_with(|last| *last.borrow_mut() = Some(text));
}

unsafe extern "C" fn notice_handler(_message: *const c_char, _userdata: *mut c_void) {}

/// Run one native call with the calling thread's session.
///
/// Creates the session on first use. If initialization fails nothing is
/// cached, so the next call retries. The thread-local borrow is dropped
/// before `f` runs, which keeps the adapter reentrant: drops of other
/// handles inside `f` may call back into it.
pub(crate) fn with_context<T>(f: impl FnOnce(GEOSContextHandle_t) -> T) -> Result<T> {
    let handle = CONTEXT
        .try_with(|slot| {
            let mut slot = slot.borrow_mut();
            match &*slot {
                Some(context) => Ok(context.handle),
                None => {
                    let context = ThreadContext::new()?;
                    let handle = context.handle;
                    *slot = Some(context);
                    Ok::<_, GeobindError>(handle)
                }
            }
        })
        .map_err(|_| {
            // The slot is already destroyed during thread exit. Callers in
            // drop paths ignore the error, skipping the native free.
            GeobindError::EngineInitialization(
                "engine session is no longer available on this thread".to_string(),
            )
        })??;
    Ok(f(handle))
}

/// Take the last error message recorded by the engine's handler.
pub(crate) fn take_last_error() -> Option<String> {
    LAST_ERROR
        .try_with(|last| last.borrow_mut().take())
        .ok()
        .flatten()
}

/// Typed error for a native call that returned its failure sentinel,
/// carrying whatever message the engine reported.
pub(crate) fn native_error(op: &'static str) -> GeobindError {
    GeobindError::NativeCall {
        op,
        message: take_last_error().unwrap_or_else(|| "no error message reported".to_string()),
    }
}

/// Translate a native boolean predicate result (0/1, 2 on exception).
pub(crate) fn check_predicate(ret: c_char, op: &'static str) -> Result<bool> {
    match ret {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(native_error(op)),
    }
}
