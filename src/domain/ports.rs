use std::os::raw::c_int;

use async_trait::async_trait;

use crate::api::FfiStatus;
use crate::bridge::{DeferredCaller, DetachedCaller};
use crate::utils::error::{FfiError, Result};

/// Anything that can perform the blocking `rust_sleep` call.
pub trait RustSleep: Send + Sync + 'static {
    fn rust_sleep(&self, delay_ms: c_int) -> c_int;
}

/// Awaitable access to the native sleep.
#[async_trait]
pub trait SleepBackend: Send + Sync {
    /// Sleep for `delay_ms` off the async runtime. A non-zero native status
    /// becomes `FfiError::NativeStatusError`.
    async fn sleep_ms(&self, delay_ms: i32) -> Result<()>;

    fn describe(&self) -> &'static str;
}

pub fn check_status(function: &'static str, code: c_int) -> Result<()> {
    match FfiStatus::from_code(code) {
        Some(FfiStatus::Ok) => Ok(()),
        _ => Err(FfiError::NativeStatusError { function, code }),
    }
}

#[async_trait]
impl<L: RustSleep> SleepBackend for DeferredCaller<L> {
    async fn sleep_ms(&self, delay_ms: i32) -> Result<()> {
        let code = self.call(move |lib| lib.rust_sleep(delay_ms)).await?;
        check_status("rust_sleep", code)
    }

    fn describe(&self) -> &'static str {
        "deferred"
    }
}

#[async_trait]
impl<L: RustSleep> SleepBackend for DetachedCaller<L> {
    async fn sleep_ms(&self, delay_ms: i32) -> Result<()> {
        let code = self.call(move |lib| lib.rust_sleep(delay_ms)).await?;
        check_status("rust_sleep", code)
    }

    fn describe(&self) -> &'static str {
        "detached"
    }
}
