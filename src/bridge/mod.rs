//! Turning blocking native calls into futures.
//!
//! [`DeferredCaller`] serializes every call onto one dedicated worker
//! thread; [`DetachedCaller`] gives each call its own blocking thread.
//! Either way the async runtime keeps running while the native code blocks.

pub mod channel;
pub mod deferred;
pub mod detached;

pub use channel::{Channel, ChannelClosed};
pub use deferred::DeferredCaller;
pub use detached::DetachedCaller;

use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("worker is shut down; the call was not executed")]
    Closed,

    #[error("native call panicked: {message}")]
    Panicked { message: String },
}

impl CallError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        CallError::Panicked { message }
    }
}
