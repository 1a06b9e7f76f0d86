use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::oneshot;

use super::channel::Channel;
use super::CallError;
use crate::utils::error::Result;

type Job<L> = Box<dyn FnOnce(&L) + Send + 'static>;

static NEXT_WORKER_ID: AtomicUsize = AtomicUsize::new(0);

/// Runs calls against a library on one dedicated worker thread and hands
/// the results back as futures.
///
/// ```no_run
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use async_python_ffi::bridge::DeferredCaller;
/// use async_python_ffi::loader::{AsyncPythonFfi, RustSleep};
///
/// let caller = DeferredCaller::new(AsyncPythonFfi::in_process())?;
/// let status = caller.call(|lib| lib.rust_sleep(5500)).await?;
/// assert_eq!(status, 0);
/// # Ok(())
/// # }
/// ```
///
/// All calls made through the same caller run on the same thread, so they
/// never overlap. Create several callers when calls into one library should
/// run in parallel.
pub struct DeferredCaller<L> {
    library: Arc<L>,
    calls: Channel<Job<L>>,
    worker: Option<JoinHandle<()>>,
    name: String,
}

impl<L> DeferredCaller<L>
where
    L: Send + Sync + 'static,
{
    pub fn new(library: L) -> Result<Self> {
        Self::from_arc(Arc::new(library))
    }

    /// Share an already wrapped library, e.g. between several callers.
    pub fn from_arc(library: Arc<L>) -> Result<Self> {
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        let name = format!("ffi-deferred-{}", id);
        let calls: Channel<Job<L>> = Channel::unbounded();

        let worker = {
            let calls = calls.clone();
            let library = Arc::clone(&library);
            thread::Builder::new().name(name.clone()).spawn(move || {
                tracing::debug!("Deferred worker started");
                for job in &calls {
                    job(&*library);
                }
                tracing::debug!("Deferred worker stopped");
            })?
        };

        Ok(Self {
            library,
            calls,
            worker: Some(worker),
            name,
        })
    }

    /// Queue `f` on the worker thread and wait for its result.
    pub async fn call<F, T>(&self, f: F) -> std::result::Result<T, CallError>
    where
        F: FnOnce(&L) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job<L> = Box::new(move |library: &L| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(library)))
                .map_err(CallError::from_panic);
            if let Err(CallError::Panicked { message }) = &outcome {
                tracing::error!("Deferred call panicked: {}", message);
            }
            // The awaiting side may have been dropped; nothing to report then.
            let _ = tx.send(outcome);
        });

        if self.calls.add(job).is_err() {
            return Err(CallError::Closed);
        }

        // A dropped sender means the job was discarded by a close.
        rx.await.unwrap_or(Err(CallError::Closed))
    }

    pub fn library(&self) -> &Arc<L> {
        &self.library
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of calls waiting for the worker, not counting the one running.
    pub fn pending(&self) -> usize {
        self.calls.len()
    }

    /// Stop accepting calls. Queued calls resolve with `CallError::Closed`;
    /// the call already running is allowed to finish.
    pub fn close(&self) {
        self.calls.close();
    }

    /// Like [`close`](Self::close), then wait for the running call to finish.
    ///
    /// This blocks the current thread; from async code prefer dropping the caller.
    pub fn shutdown(mut self) {
        self.calls.close();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Deferred worker {} exited abnormally", self.name);
            }
        }
    }
}

impl<L> fmt::Debug for DeferredCaller<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCaller")
            .field("name", &self.name)
            .field("pending", &self.calls.len())
            .field("open", &self.calls.is_open())
            .finish()
    }
}

impl<L> Drop for DeferredCaller<L> {
    fn drop(&mut self) {
        // The worker is left detached; it exits after its current call.
        self.calls.close();
    }
}
