//! C-compatible API loaded by foreign runtimes through `dlopen`.
//!
//! Nothing here may unwind into the caller; failures are reported as
//! `FfiStatus` codes.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

use crate::native;

/// Current ABI version. Bump when an export changes signature.
pub const API_VERSION: u32 = 1;

/// Stable status codes returned across the FFI boundary.
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FfiStatus {
    /// The call completed.
    Ok = 0,
    /// An argument could not be converted (e.g. a negative delay).
    InvalidArgument = 1,
}

impl FfiStatus {
    pub fn from_code(code: c_int) -> Option<Self> {
        match code {
            0 => Some(FfiStatus::Ok),
            1 => Some(FfiStatus::InvalidArgument),
            _ => None,
        }
    }

    pub fn as_cstr(self) -> &'static CStr {
        match self {
            FfiStatus::Ok => c"ok",
            FfiStatus::InvalidArgument => c"invalid argument",
        }
    }
}

/// Block the calling thread for `delay_ms` milliseconds.
///
/// Returns `0` on success and `1` (without sleeping) when the delay is negative.
#[no_mangle]
pub extern "C" fn rust_sleep(delay_ms: c_int) -> c_int {
    let status = match native::sleep_for(delay_ms) {
        Ok(_) => FfiStatus::Ok,
        Err(err) => {
            tracing::warn!("rust_sleep rejected its argument: {}", err);
            FfiStatus::InvalidArgument
        }
    };
    status as c_int
}

/// ABI version to coordinate with the loading side.
#[no_mangle]
pub extern "C" fn async_python_ffi_api_version() -> u32 {
    API_VERSION
}

/// Human readable description of a status code. The returned string is static; do not free it.
#[no_mangle]
pub extern "C" fn async_python_ffi_status_str(code: c_int) -> *const c_char {
    match FfiStatus::from_code(code) {
        Some(status) => status.as_cstr().as_ptr(),
        None => c"unknown status".as_ptr(),
    }
}
