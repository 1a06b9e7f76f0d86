use std::fmt;
use std::sync::Arc;

use super::CallError;

/// Runs every call on its own blocking thread, so calls may overlap.
///
/// Must be used from inside a Tokio runtime.
pub struct DetachedCaller<L> {
    library: Arc<L>,
}

impl<L> Clone for DetachedCaller<L> {
    fn clone(&self) -> Self {
        Self {
            library: Arc::clone(&self.library),
        }
    }
}

impl<L> fmt::Debug for DetachedCaller<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachedCaller").finish_non_exhaustive()
    }
}

impl<L> DetachedCaller<L>
where
    L: Send + Sync + 'static,
{
    pub fn new(library: L) -> Self {
        Self::from_arc(Arc::new(library))
    }

    pub fn from_arc(library: Arc<L>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Arc<L> {
        &self.library
    }

    pub async fn call<F, T>(&self, f: F) -> Result<T, CallError>
    where
        F: FnOnce(&L) -> T + Send + 'static,
        T: Send + 'static,
    {
        let library = Arc::clone(&self.library);
        match tokio::task::spawn_blocking(move || f(&library)).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_panic() => {
                let err = CallError::from_panic(err.into_panic());
                tracing::error!("Detached call failed: {}", err);
                Err(err)
            }
            Err(_) => Err(CallError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_calls_run_in_parallel() {
        // Both calls must be inside the barrier at once to get past it.
        let caller = DetachedCaller::new(Barrier::new(2));
        let first = caller.call(|barrier| barrier.wait().is_leader());
        let second = caller.call(|barrier| barrier.wait().is_leader());

        let (a, b) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(first, second)
        })
        .await
        .expect("calls did not overlap");

        assert_ne!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_panic_maps_to_call_error() {
        let caller = DetachedCaller::new(());
        let err = caller
            .call::<_, ()>(|_| panic!("{} went wrong", "detached"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CallError::Panicked {
                message: "detached went wrong".to_string()
            }
        );
    }
}
