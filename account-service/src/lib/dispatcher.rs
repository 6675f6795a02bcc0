use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DrainError {
    #[error("Drain deadline elapsed with {in_flight} task(s) still running")]
    DeadlineElapsed { in_flight: usize },
}

#[derive(Debug, Default)]
struct DispatcherState {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Runs deferred work off the request path.
///
/// Submitted tasks run concurrently on the tokio runtime. A task never reports
/// back to its submitter: it handles and logs its own errors, and a panic
/// inside it is caught and logged here. The dispatcher only tracks how many
/// tasks are in flight so shutdown can wait for them with [`drain`].
///
/// [`drain`]: TaskDispatcher::drain
#[derive(Debug, Clone, Default)]
pub struct TaskDispatcher {
    state: Arc<DispatcherState>,
}

/// Counts one in-flight task for as long as it is alive.
///
/// Dropped when the task future finishes, panics, or is discarded by the
/// runtime, so the count cannot leak.
struct InFlightGuard {
    state: Arc<DispatcherState>,
}

impl InFlightGuard {
    fn acquire(state: &Arc<DispatcherState>) -> Self {
        state.in_flight.fetch_add(1, Ordering::AcqRel);
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.state.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}

impl TaskDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `label` - Short name used when logging a panic
    /// * `task` - Work to run; its output is discarded
    pub fn submit<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = InFlightGuard::acquire(&self.state);

        tokio::spawn(async move {
            let _guard = guard;

            if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                tracing::error!(
                    task = label,
                    panic = %panic_message(panic.as_ref()),
                    "Deferred task panicked"
                );
            }
        });
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::Acquire)
    }

    /// Wait until every submitted task has finished.
    pub async fn drain(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Wait for in-flight tasks, giving up after `deadline`.
    ///
    /// # Errors
    /// * `DeadlineElapsed` - Tasks were still running when the deadline passed
    pub async fn drain_with_deadline(&self, deadline: Duration) -> Result<(), DrainError> {
        tokio::time::timeout(deadline, self.drain())
            .await
            .map_err(|_| DrainError::DeadlineElapsed {
                in_flight: self.in_flight(),
            })
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;

    #[tokio::test]
    async fn test_drain_without_tasks_returns_immediately() {
        let dispatcher = TaskDispatcher::new();
        dispatcher.drain().await;
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_submit_counts_and_drain_waits() {
        let dispatcher = TaskDispatcher::new();
        let finished = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&finished);
        dispatcher.submit("sleepy", async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });

        assert_eq!(dispatcher.in_flight(), 1);

        dispatcher.drain().await;

        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_released() {
        let dispatcher = TaskDispatcher::new();
        let sibling_ran = Arc::new(AtomicBool::new(false));

        dispatcher.submit("explodes", async {
            panic!("template missing");
        });

        let flag = Arc::clone(&sibling_ran);
        dispatcher.submit("sibling", async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(true, Ordering::SeqCst);
        });

        dispatcher
            .drain_with_deadline(Duration::from_secs(5))
            .await
            .expect("Drain should complete despite the panic");

        assert!(sibling_ran.load(Ordering::SeqCst));
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_drain_deadline_elapsed() {
        let dispatcher = TaskDispatcher::new();

        dispatcher.submit("slow", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let result = dispatcher
            .drain_with_deadline(Duration::from_millis(20))
            .await;

        assert_eq!(result, Err(DrainError::DeadlineElapsed { in_flight: 1 }));
    }

    #[tokio::test]
    async fn test_clones_share_the_counter() {
        let dispatcher = TaskDispatcher::new();
        let clone = dispatcher.clone();

        clone.submit("from-clone", async {
            tokio::time::sleep(Duration::from_millis(10)).await;
        });

        assert_eq!(dispatcher.in_flight(), 1);
        dispatcher.drain().await;
        assert_eq!(clone.in_flight(), 0);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");

        let boxed: Box<dyn Any + Send> = Box::new(17_u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
