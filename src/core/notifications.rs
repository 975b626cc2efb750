//! Process-wide transient user feedback.
//!
//! Toasts are appended by any component and drained by whichever display
//! surface subscribed to the bus. Each toast lives for a fixed TTL or until
//! it is dismissed; expiry is evaluated lazily whenever the list is read.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

pub type ToastId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
}

pub type Subscriber = Arc<dyn Fn(&Toast) + Send + Sync>;

struct Entry {
    toast: Toast,
    expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    next_id: ToastId,
    entries: Vec<Entry>,
    subscribers: Vec<Subscriber>,
}

impl Inner {
    fn prune(&mut self, now: Instant) {
        self.entries.retain(|entry| entry.expires_at > now);
    }
}

#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<Mutex<Inner>>,
    ttl: Duration,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TOAST_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            })),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Attach a display surface; it sees every toast as it is shown
    pub fn subscribe(&self, subscriber: Subscriber) {
        self.lock().subscribers.push(subscriber);
    }

    pub fn show(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        let now = Instant::now();
        let (toast, subscribers) = {
            let mut inner = self.lock();
            inner.prune(now);

            let id = inner.next_id;
            inner.next_id += 1;

            let toast = Toast {
                id,
                message: message.into(),
                severity,
            };
            inner.entries.push(Entry {
                toast: toast.clone(),
                expires_at: now + self.ttl,
            });
            (toast, inner.subscribers.clone())
        };

        // Subscribers run outside the lock so they may call back into the bus
        for subscriber in subscribers {
            subscriber(&toast);
        }
        toast.id
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Info)
    }

    /// Returns `true` if the toast was still present
    pub fn dismiss(&self, id: ToastId) -> bool {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.toast.id != id);
        inner.entries.len() != before
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Instant::now())
    }

    pub fn active_at(&self, now: Instant) -> Vec<Toast> {
        let mut inner = self.lock();
        inner.prune(now);
        inner.entries.iter().map(|e| e.toast.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_assigns_unique_ids() {
        let bus = NotificationBus::new();
        let first = bus.success("Saved");
        let second = bus.error("Failed");
        assert_ne!(first, second);

        let active = bus.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].severity, Severity::Success);
        assert_eq!(active[1].message, "Failed");
    }

    #[test]
    fn test_dismiss_removes_toast() {
        let bus = NotificationBus::new();
        let id = bus.warning("Check the form");
        assert!(bus.dismiss(id));
        assert!(!bus.dismiss(id));
        assert!(bus.active().is_empty());
    }

    #[test]
    fn test_toasts_expire_after_ttl() {
        let bus = NotificationBus::with_ttl(Duration::from_secs(5));
        bus.info("Heads up");

        let soon = Instant::now() + Duration::from_secs(1);
        assert_eq!(bus.active_at(soon).len(), 1);

        let later = Instant::now() + Duration::from_secs(6);
        assert!(bus.active_at(later).is_empty());
    }

    #[test]
    fn test_subscribers_receive_toasts() {
        let bus = NotificationBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(Arc::new(move |toast: &Toast| {
            sink.lock().unwrap().push(toast.message.clone());
        }));

        bus.error("Network error");
        bus.success("Created");
        assert_eq!(*seen.lock().unwrap(), vec!["Network error", "Created"]);
    }

    #[test]
    fn test_clones_share_state() {
        let bus = NotificationBus::new();
        let clone = bus.clone();
        let id = clone.error("from clone");
        assert_eq!(bus.active().len(), 1);
        assert!(bus.dismiss(id));
        assert!(clone.active().is_empty());
    }
}
