//! Task scheduling.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::transport::BoxFuture;

/// Runs futures in the background, now or after a delay.
///
/// The validation pipeline never blocks: every round-trip and every
/// deferred dispatch goes through a scheduler. Tests substitute one that
/// runs tasks deterministically.
pub trait Scheduler: Send + Sync {
    /// Starts a task.
    fn spawn(&self, task: BoxFuture<'static, ()>);

    /// Starts a task once `delay` has elapsed.
    fn spawn_after(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

/// A [`Scheduler`] running tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler for the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a scheduler for the runtime the caller is running on.
    ///
    /// Returns `None` outside of a tokio runtime.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }

    fn spawn_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_current_outside_runtime() {
        assert!(TokioScheduler::current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_after_waits() {
        let scheduler = TokioScheduler::current().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        scheduler.spawn_after(
            Duration::from_millis(200),
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
