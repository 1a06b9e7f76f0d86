pub mod api;
pub mod app;
pub mod bridge;
pub mod config;
pub mod domain;
pub mod loader;
pub mod native;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use api::ffi::{rust_sleep, FfiStatus};
pub use app::{build_backend, SheepDemo};
pub use bridge::{CallError, DeferredCaller, DetachedCaller};
pub use config::{CallStrategy, DemoConfig};
pub use domain::ports::{RustSleep, SleepBackend};
pub use loader::{AsyncPythonFfi, LibrarySpec, SpecLibrary};
pub use utils::error::{FfiError, Result};
