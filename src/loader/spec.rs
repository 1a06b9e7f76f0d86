use std::os::raw::c_int;

use libloading::Library;

use super::{symbol, LibrarySpec};
use crate::api::ffi;
use crate::domain::ports::RustSleep;
use crate::utils::error::{FfiError, Result};

pub type RustSleepFn = extern "C" fn(delay_ms: c_int) -> c_int;
pub type ApiVersionFn = extern "C" fn() -> u32;

/// Exports of this crate's own shared library.
#[derive(Clone, Copy, Debug)]
pub struct AsyncPythonFfi {
    rust_sleep: RustSleepFn,
    api_version: ApiVersionFn,
}

impl AsyncPythonFfi {
    /// Bind the exports compiled into the current binary, without `dlopen`.
    pub fn in_process() -> Self {
        Self {
            rust_sleep: ffi::rust_sleep,
            api_version: ffi::async_python_ffi_api_version,
        }
    }

    pub fn api_version(&self) -> u32 {
        (self.api_version)()
    }

    /// Reject a library built against a different ABI version.
    pub fn check_api_version(&self) -> Result<()> {
        let found = self.api_version();
        if found != ffi::API_VERSION {
            return Err(FfiError::AbiMismatchError {
                expected: ffi::API_VERSION,
                found,
            });
        }
        Ok(())
    }
}

impl LibrarySpec for AsyncPythonFfi {
    const NAME: &'static str = "AsyncPythonFfi";
    const EXPORTS: &'static [&'static str] = &["rust_sleep", "async_python_ffi_api_version"];

    unsafe fn bind(library: &Library) -> Result<Self> {
        let bound = Self {
            rust_sleep: symbol::<RustSleepFn>(library, "rust_sleep")?,
            api_version: symbol::<ApiVersionFn>(library, "async_python_ffi_api_version")?,
        };

        bound.check_api_version()?;
        Ok(bound)
    }
}

impl RustSleep for AsyncPythonFfi {
    fn rust_sleep(&self, delay_ms: c_int) -> c_int {
        (self.rust_sleep)(delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_process_exports() {
        let lib = AsyncPythonFfi::in_process();
        assert_eq!(lib.api_version(), ffi::API_VERSION);
        assert_eq!(lib.rust_sleep(1), 0);
        assert_eq!(lib.rust_sleep(-1), 1);
        assert!(lib.check_api_version().is_ok());
    }

    #[test]
    fn test_future_abi_version_is_rejected() {
        extern "C" fn next_version() -> u32 {
            ffi::API_VERSION + 1
        }

        let lib = AsyncPythonFfi {
            api_version: next_version,
            ..AsyncPythonFfi::in_process()
        };

        match lib.check_api_version() {
            Err(FfiError::AbiMismatchError { expected, found }) => {
                assert_eq!(expected, ffi::API_VERSION);
                assert_eq!(found, ffi::API_VERSION + 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
