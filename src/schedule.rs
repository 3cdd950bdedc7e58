//! Cancellable delayed tasks and the debouncer built on them.
//!
//! [`ScheduledTask`] owns at most one pending tokio task. Scheduling again
//! aborts whatever was pending, so there is never more than one callback
//! waiting per owner. Dropping the owner aborts the pending task too.
//!
//! [`Debouncer`] wraps a `ScheduledTask` with a fixed quiet period: each
//! [`Debouncer::trigger`] restarts the wait, and only the value passed to the
//! last trigger reaches the action.
//!
//! Both must be used from inside a tokio runtime.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// None of the state guarded in this crate can be left half-updated by a
/// panic, so poisoning carries no information here.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A single delayed task slot: schedule, cancel, reschedule.
#[derive(Debug, Default)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` after `delay`, replacing any task still pending.
    pub fn schedule<F>(&mut self, delay: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel() {
            trace!("rescheduled pending task");
        }
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            work.await;
        }));
    }

    /// Abort the pending task. Returns `true` if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a scheduled task has not yet completed.
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Coalesces rapid triggers into one call of `action` with the latest value.
pub struct Debouncer<T> {
    quiet: Duration,
    action: Action<T>,
    task: Mutex<ScheduledTask>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(quiet: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            quiet,
            action: Arc::new(action),
            task: Mutex::new(ScheduledTask::new()),
        }
    }

    /// Restart the quiet period; `value` supersedes any pending one.
    pub fn trigger(&self, value: T) {
        let action = Arc::clone(&self.action);
        lock(&self.task).schedule(self.quiet, async move { action(value) });
    }

    /// Drop the pending value without running the action.
    pub fn cancel(&self) -> bool {
        lock(&self.task).cancel()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.task).is_pending()
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("quiet", &self.quiet)
            .field("action", &"<dyn Fn>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(String) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: String| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_runs_after_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let mut task = ScheduledTask::new();
        task.schedule(Duration::from_millis(100), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.is_pending());

        sleep(Duration::from_millis(99)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_run() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let mut task = ScheduledTask::new();
        task.schedule(Duration::from_millis(100), async move {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.cancel());
        assert!(!task.cancel(), "second cancel has nothing to abort");

        sleep(Duration::from_millis(500)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_owner_aborts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        {
            let mut task = ScheduledTask::new();
            task.schedule(Duration::from_millis(10), async move {
                h.fetch_add(1, Ordering::SeqCst);
            });
        }
        sleep(Duration::from_millis(50)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_triggers_coalesce_to_last_value() {
        let (seen, action) = recorder();
        let d = Debouncer::new(Duration::from_millis(500), action);

        d.trigger("<p>a".to_string());
        sleep(Duration::from_millis(200)).await;
        d.trigger("<p>ab".to_string());
        sleep(Duration::from_millis(200)).await;
        d.trigger("<p>abc".to_string());

        sleep(Duration::from_millis(499)).await;
        assert!(seen.lock().unwrap().is_empty(), "still inside quiet period");
        assert!(d.is_pending());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["<p>abc".to_string()]);
        assert!(!d.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_triggers_each_fire() {
        let (seen, action) = recorder();
        let d = Debouncer::new(Duration::from_millis(500), action);

        d.trigger("one".to_string());
        sleep(Duration::from_millis(600)).await;
        d.trigger("two".to_string());
        sleep(Duration::from_millis(600)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn debouncer_cancel_discards_pending_value() {
        let (seen, action) = recorder();
        let d = Debouncer::new(Duration::from_millis(500), action);
        d.trigger("gone".to_string());
        assert!(d.cancel());
        sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
