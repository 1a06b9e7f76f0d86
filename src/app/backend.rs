use std::sync::Arc;

use crate::bridge::{DeferredCaller, DetachedCaller};
use crate::config::toml_config::{CallStrategy, LibrarySection};
use crate::domain::ports::{RustSleep, SleepBackend};
use crate::loader::{AsyncPythonFfi, SpecLibrary};
use crate::utils::error::Result;

/// Pick the exports (loaded library or linked-in) and wrap them in the configured caller.
pub fn build_backend(library: &LibrarySection) -> Result<Arc<dyn SleepBackend>> {
    match &library.path {
        Some(path) => {
            // SAFETY: the path is expected to point at this crate's cdylib; every
            // export is checked against `AsyncPythonFfi` and its ABI version before use.
            let loaded = unsafe { SpecLibrary::<AsyncPythonFfi>::open(path)? };
            wrap(loaded, library.strategy)
        }
        None => {
            tracing::debug!("Using linked-in exports");
            wrap(AsyncPythonFfi::in_process(), library.strategy)
        }
    }
}

pub fn wrap<L: RustSleep>(library: L, strategy: CallStrategy) -> Result<Arc<dyn SleepBackend>> {
    let backend: Arc<dyn SleepBackend> = match strategy {
        CallStrategy::Deferred => Arc::new(DeferredCaller::new(library)?),
        CallStrategy::Detached => Arc::new(DetachedCaller::new(library)),
    };
    tracing::debug!("Native calls use the {} strategy", backend.describe());
    Ok(backend)
}
