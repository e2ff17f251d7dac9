//! Cancellable scheduled tasks and the autosave debouncer.
//!
//! `TaskScheduler::schedule(delay, fut)` spawns a Tokio task that waits for
//! `delay` and then runs `fut`, unless the returned [`TaskHandle`] was
//! cancelled first. Every handle hangs off the scheduler's root
//! `CancellationToken`, so `shutdown()` cancels everything still pending.
//!
//! [`Debouncer`] keeps at most one pending handle: arming it again cancels
//! the previous timer, so only the last trigger of a burst fires. Dropping
//! the debouncer cancels the pending timer.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Monotonic id of a scheduled task, unique per scheduler.
pub type TaskId = u64;

/// Handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the delay elapsed and the task started running.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Neither cancelled nor fired yet.
    pub fn is_pending(&self) -> bool {
        !self.is_cancelled() && !self.has_fired()
    }
}

/// Spawns delayed tasks on the current Tokio runtime.
///
/// Cloneable & cheap: clones share the root token and the id counter.
#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
    root: CancellationToken,
    next_id: Arc<AtomicU64>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler whose tasks are also cancelled when `parent` is.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            root: parent.child_token(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `fut` after `delay` unless the handle is cancelled first.
    pub fn schedule<F>(&self, delay: Duration, fut: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.schedule_with(delay, |_| fut)
    }

    /// Like [`schedule`](Self::schedule), but the future is built from the
    /// id the task is given.
    pub fn schedule_with<M, F>(&self, delay: Duration, make: M) -> TaskHandle
    where
        M: FnOnce(TaskId) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let fut = make(id);
        let token = self.root.child_token();
        let fired = Arc::new(AtomicBool::new(false));

        let handle = TaskHandle {
            id,
            token: token.clone(),
            fired: fired.clone(),
        };

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!("scheduled task {id} cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    fired.store(true, Ordering::Release);
                    trace!("scheduled task {id} firing after {delay:?}");
                    fut.await;
                }
            }
        });

        handle
    }

    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
    }

    /// Cancel every task scheduled through this scheduler (and its clones).
    pub fn shutdown(&self) {
        debug!("task scheduler shutting down");
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

/// Restartable single-shot timer.
#[derive(Debug)]
pub struct Debouncer {
    scheduler: TaskScheduler,
    delay: Duration,
    pending: Option<TaskHandle>,
}

impl Debouncer {
    pub fn new(scheduler: TaskScheduler, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending timer and start a new one that runs `fut`.
    pub fn arm<F>(&mut self, fut: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.arm_with(|_| fut)
    }

    /// Like [`arm`](Self::arm), but the future learns its own timer id, so
    /// whatever it reports can be matched against the timer still armed.
    pub fn arm_with<M, F>(&mut self, make: M) -> TaskId
    where
        M: FnOnce(TaskId) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let handle = self.scheduler.schedule_with(self.delay, make);
        let id = handle.id();
        self.pending = Some(handle);
        id
    }

    /// Cancel the pending timer. Returns true if one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_pending = handle.is_pending();
                self.scheduler.cancel(&handle);
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| h.is_pending())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_runs_after_delay() {
        let scheduler = TaskScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = scheduler.schedule(Duration::from_millis(500), async move {
            let _ = tx.send(());
        });
        assert!(handle.is_pending());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(rx.recv().await.is_some());
        assert!(handle.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_runs() {
        let scheduler = TaskScheduler::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let handle = scheduler.schedule(Duration::from_millis(100), async move {
            let _ = tx.send(());
        });
        scheduler.cancel(&handle);

        tokio::time::sleep(Duration::from_millis(500)).await;
        // The sender was dropped together with the cancelled future.
        assert!(rx.recv().await.is_none());
        assert!(!handle.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_everything() {
        let scheduler = TaskScheduler::new();
        let a = scheduler.schedule(Duration::from_secs(1), async {});
        let b = scheduler.clone().schedule(Duration::from_secs(2), async {});
        scheduler.shutdown();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn debouncer_keeps_only_the_last_trigger_of_a_burst() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(TaskScheduler::new(), Duration::from_millis(2000));

        for i in 0..5 {
            let tx = tx.clone();
            debouncer.arm(async move {
                let _ = tx.send(i);
            });
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        drop(tx);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(rx.recv().await, Some(4));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn armed_future_reports_its_own_timer_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(TaskScheduler::new(), Duration::from_millis(100));

        let first = debouncer.arm_with(|id| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(id);
            }
        });
        let second = debouncer.arm_with(|id| async move {
            let _ = tx.send(id);
        });
        assert_ne!(first, second);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(rx.recv().await, Some(second));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_debouncer_cancels_the_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        {
            let mut debouncer = Debouncer::new(TaskScheduler::new(), Duration::from_millis(50));
            debouncer.arm(async move {
                let _ = tx.send(());
            });
            assert!(debouncer.is_pending());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.recv().await.is_none());
    }
}
