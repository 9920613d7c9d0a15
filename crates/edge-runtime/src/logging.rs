//! Log muting for `loggingEnabled = false`
//!
//! The runtime logs through `tracing`. When an embedder turns logging off, the
//! controller runs its work under a `NoSubscriber` dispatcher instead of
//! filtering each call site. Spawned tasks inherit whichever dispatcher is
//! current at spawn time.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::subscriber::NoSubscriber;

/// Run `f`, muted when logging is disabled
pub(crate) fn with_logging<T>(enabled: bool, f: impl FnOnce() -> T) -> T {
    if enabled {
        f()
    } else {
        tracing::subscriber::with_default(NoSubscriber::default(), f)
    }
}

/// Await `future`, muted when logging is disabled
pub(crate) async fn with_logging_async<F: Future>(enabled: bool, future: F) -> F::Output {
    if enabled {
        future.await
    } else {
        future.with_subscriber(NoSubscriber::default()).await
    }
}

/// Spawn a task that keeps the caller's dispatcher
pub(crate) fn spawn_traced<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future.with_current_subscriber())
}
