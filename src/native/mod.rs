//! Blocking routines exported through the C ABI.
//!
//! Everything here runs on whatever thread the foreign caller uses, so it
//! must never assume an async runtime is present.

use std::thread;
use std::time::Duration;

use crate::utils::error::{FfiError, Result};

/// Convert a C millisecond count into a `Duration`. Negative values are rejected.
pub fn delay_from_c(delay_ms: i32) -> Result<Duration> {
    let millis: u64 = delay_ms
        .try_into()
        .map_err(|_| FfiError::InvalidArgumentError {
            field: "delay_ms",
            reason: format!("expected a non-negative delay, got {}", delay_ms),
        })?;
    Ok(Duration::from_millis(millis))
}

/// Block the current thread for `delay_ms` milliseconds.
pub fn sleep_for(delay_ms: i32) -> Result<Duration> {
    let delay = delay_from_c(delay_ms)?;
    tracing::debug!("Sleeping natively for {:?}", delay);
    thread::sleep(delay);
    Ok(delay)
}
