//! Single-slot status display.
//!
//! [`StatusBoard`] holds at most one [`StatusMessage`]. Showing a message
//! first discards the current one; there is no queue. Success messages
//! expire on their own: after the configured lifetime they turn
//! [`StatusPhase::Fading`], and after the fade they are removed. Error and
//! info messages stay until the next call replaces them.
//!
//! Presentation is delegated to a [`StatusObserver`]. The CLI prints coloured
//! lines; an embedding UI could restyle a widget instead. Severity only drives
//! that styling, never behaviour.

use crate::schedule::{lock, ScheduledTask};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::debug;

/// Presentation tag of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        })
    }
}

/// Whether a displayed message is fully visible or on its way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPhase {
    Visible,
    Fading,
}

/// The message currently occupying the status slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Monotonic per-board id; distinguishes a message from its successors.
    pub id: u64,
    pub text: String,
    pub severity: Severity,
    pub phase: StatusPhase,
}

/// Receives status slot changes.
///
/// All methods default to no-ops so implementors only override what they
/// render. Calls happen outside the board's lock, so an observer may read
/// [`StatusBoard::current`] from inside a callback.
pub trait StatusObserver: Send + Sync {
    /// A new message entered the slot.
    fn on_shown(&self, message: &StatusMessage) {
        let _ = message;
    }

    /// A success message reached the end of its lifetime and started fading.
    fn on_fading(&self, message: &StatusMessage) {
        let _ = message;
    }

    /// A message left the slot, either replaced or expired.
    fn on_cleared(&self, message: &StatusMessage) {
        let _ = message;
    }
}

/// Observer that ignores every event. The default.
pub struct NoopStatusObserver;

impl StatusObserver for NoopStatusObserver {}

struct BoardInner {
    slot: Mutex<Option<StatusMessage>>,
    next_id: AtomicU64,
    observer: Arc<dyn StatusObserver>,
    expiry: Mutex<ScheduledTask>,
    lifetime: Duration,
    fade: Duration,
}

/// The single status slot.
#[derive(Clone)]
pub struct StatusBoard {
    inner: Arc<BoardInner>,
}

impl StatusBoard {
    /// `lifetime` is how long success messages stay before fading; `fade`
    /// is the delay between fading and removal.
    pub fn new(lifetime: Duration, fade: Duration, observer: Arc<dyn StatusObserver>) -> Self {
        Self {
            inner: Arc::new(BoardInner {
                slot: Mutex::new(None),
                next_id: AtomicU64::new(1),
                observer,
                expiry: Mutex::new(ScheduledTask::new()),
                lifetime,
                fade,
            }),
        }
    }

    /// Replace whatever is displayed with `text`.
    ///
    /// Must be called from inside a tokio runtime when `severity` is
    /// [`Severity::Success`], since that schedules the expiry.
    pub fn show(&self, text: impl Into<String>, severity: Severity) -> StatusMessage {
        let inner = &self.inner;
        let message = StatusMessage {
            id: inner.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.into(),
            severity,
            phase: StatusPhase::Visible,
        };

        lock(&inner.expiry).cancel();
        let previous = lock(&inner.slot).replace(message.clone());
        if let Some(ref old) = previous {
            inner.observer.on_cleared(old);
        }
        debug!(severity = %severity, "status: {}", message.text);
        inner.observer.on_shown(&message);

        if severity == Severity::Success {
            let weak = Arc::downgrade(inner);
            let id = message.id;
            lock(&inner.expiry).schedule(inner.lifetime, expire(weak, id));
        }
        message
    }

    /// Remove the current message, if any.
    pub fn clear(&self) {
        lock(&self.inner.expiry).cancel();
        let previous = lock(&self.inner.slot).take();
        if let Some(ref old) = previous {
            self.inner.observer.on_cleared(old);
        }
    }

    /// Snapshot of the slot.
    pub fn current(&self) -> Option<StatusMessage> {
        lock(&self.inner.slot).clone()
    }
}

impl fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusBoard")
            .field("current", &self.current())
            .field("lifetime", &self.inner.lifetime)
            .field("fade", &self.inner.fade)
            .finish()
    }
}

/// Fade, then remove, message `id`, unless something replaced it meanwhile.
async fn expire(board: Weak<BoardInner>, id: u64) {
    let fade = {
        let Some(inner) = board.upgrade() else { return };
        let fading = {
            let mut slot = lock(&inner.slot);
            match slot.as_mut() {
                Some(m) if m.id == id => {
                    m.phase = StatusPhase::Fading;
                    m.clone()
                }
                _ => return,
            }
        };
        inner.observer.on_fading(&fading);
        inner.fade
    };

    tokio::time::sleep(fade).await;

    let Some(inner) = board.upgrade() else { return };
    let removed = {
        let mut slot = lock(&inner.slot);
        match slot.as_ref() {
            Some(m) if m.id == id => slot.take(),
            _ => None,
        }
    };
    if let Some(ref m) = removed {
        inner.observer.on_cleared(m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<String>>,
    }

    impl StatusObserver for EventLog {
        fn on_shown(&self, m: &StatusMessage) {
            self.events.lock().unwrap().push(format!("shown:{}", m.text));
        }
        fn on_fading(&self, m: &StatusMessage) {
            self.events.lock().unwrap().push(format!("fading:{}", m.text));
        }
        fn on_cleared(&self, m: &StatusMessage) {
            self.events.lock().unwrap().push(format!("cleared:{}", m.text));
        }
    }

    fn board() -> (StatusBoard, Arc<EventLog>) {
        let log = Arc::new(EventLog::default());
        let board = StatusBoard::new(
            Duration::from_millis(5000),
            Duration::from_millis(300),
            Arc::clone(&log) as Arc<dyn StatusObserver>,
        );
        (board, log)
    }

    #[tokio::test]
    async fn new_message_replaces_old_one_first() {
        let (board, log) = board();
        board.show("first", Severity::Info);
        board.show("second", Severity::Error);

        assert_eq!(
            *log.events.lock().unwrap(),
            vec!["shown:first", "cleared:first", "shown:second"]
        );
        let current = board.current().unwrap();
        assert_eq!(current.text, "second");
        assert_eq!(current.severity, Severity::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn success_fades_then_disappears() {
        let (board, log) = board();
        board.show("saved", Severity::Success);

        sleep(Duration::from_millis(4999)).await;
        assert_eq!(board.current().unwrap().phase, StatusPhase::Visible);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(board.current().unwrap().phase, StatusPhase::Fading);

        sleep(Duration::from_millis(300)).await;
        assert!(board.current().is_none());
        assert_eq!(
            *log.events.lock().unwrap(),
            vec!["shown:saved", "fading:saved", "cleared:saved"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn errors_and_info_persist() {
        let (board, _log) = board();
        board.show("bad input", Severity::Error);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(board.current().unwrap().text, "bad input");

        board.show("working", Severity::Info);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(board.current().unwrap().text, "working");
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_success_expiry_leaves_newer_message_alone() {
        let (board, _log) = board();
        board.show("loaded", Severity::Success);
        sleep(Duration::from_secs(1)).await;
        board.show("conversion failed", Severity::Error);

        sleep(Duration::from_secs(10)).await;
        let current = board.current().unwrap();
        assert_eq!(current.text, "conversion failed");
        assert_eq!(current.phase, StatusPhase::Visible);
    }

    #[tokio::test(start_paused = true)]
    async fn second_success_restarts_the_lifetime() {
        let (board, _log) = board();
        board.show("one", Severity::Success);
        sleep(Duration::from_secs(4)).await;
        board.show("two", Severity::Success);

        sleep(Duration::from_secs(4)).await;
        assert_eq!(board.current().unwrap().text, "two");
        sleep(Duration::from_millis(1400)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test]
    async fn clear_empties_the_slot() {
        let (board, log) = board();
        board.show("x", Severity::Info);
        board.clear();
        assert!(board.current().is_none());
        assert_eq!(log.events.lock().unwrap().last().unwrap(), "cleared:x");
    }

    #[test]
    fn ids_increase() {
        let board = StatusBoard::new(
            Duration::from_secs(5),
            Duration::from_millis(300),
            Arc::new(NoopStatusObserver),
        );
        let a = board.show("a", Severity::Error);
        let b = board.show("b", Severity::Info);
        assert!(b.id > a.id);
    }
}
