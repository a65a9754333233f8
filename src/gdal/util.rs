//! Small helpers shared by the OGR wrappers.

use std::ffi::CStr;

use libc::{c_char, c_void};

use crate::error::{GeobindError, Result};

/// Copy a C string the engine still owns.
pub(crate) fn _string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Copy a C string the engine allocated for us, then release it with
/// `VSIFree`.
pub(crate) fn _owned_string(ptr: *mut c_char) -> String {
    let text = _string(ptr);
    unsafe { gdal_sys::VSIFree(ptr as *mut c_void) };
    text
}

/// Error for a native call that returned null, carrying the message GDAL
/// recorded for the calling thread.
pub(crate) fn last_null_pointer_err(op: &'static str) -> GeobindError {
    let message = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    GeobindError::NativeCall {
        op,
        message: if message.is_empty() {
            "no error message reported".to_string()
        } else {
            message
        },
    }
}

/// Translate an `OGRErr` return code.
pub(crate) fn check_ogr_err(err: gdal_sys::OGRErr::Type, op: &'static str) -> Result<()> {
    if err == gdal_sys::OGRErr::OGRERR_NONE {
        return Ok(());
    }
    let message = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    Err(GeobindError::NativeCall {
        op,
        message: if message.is_empty() {
            format!("OGR error code {err}")
        } else {
            message
        },
    })
}

pub(crate) fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    let malformed =
        || GeobindError::GeometryConstruction(format!("invalid hex geometry input: {hex:?}"));
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(malformed());
    }
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16).ok_or_else(malformed)?;
            let low = (pair[1] as char).to_digit(16).ok_or_else(malformed)?;
            Ok((high << 4 | low) as u8)
        })
        .collect()
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(hex, "{byte:02X}");
    }
    hex
}
