//! Public entry points for foreign function interfaces.

pub mod ffi;

pub use ffi::{FfiStatus, API_VERSION};
