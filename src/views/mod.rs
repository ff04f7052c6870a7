//! Screen state for the console.
//!
//! A front end renders these objects and forwards user intents to them.
//! Toasts and confirmation prompts are injected as traits so any front end
//! or test can supply its own.

pub mod dashboard;
pub mod dialog;
pub mod entity;
pub mod list;
pub mod orders;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

pub use dashboard::{Console, Dashboard, Navigation};
pub use dialog::{Dialog, DialogState, DialogTicket};
pub use entity::EntityScreen;
pub use list::ListView;
pub use orders::OrdersScreen;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel { Success, Warning, Error }

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Success, message: message.into(), duration: Duration::from_millis(3000) }
    }
    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Warning, message: message.into(), duration: Duration::from_millis(5000) }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Error, message: message.into(), duration: Duration::from_millis(5000) }
    }
}

/// Where user-facing notifications go.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Writes toasts to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => info!(message = %toast.message, "toast"),
            ToastLevel::Warning | ToastLevel::Error => warn!(level = ?toast.level, message = %toast.message, "toast"),
        }
    }
}

/// Keeps every toast for later inspection.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self { Self::default() }
    pub fn toasts(&self) -> Vec<Toast> { self.toasts.lock().clone() }
    pub fn last(&self) -> Option<Toast> { self.toasts.lock().last().cloned() }
    pub fn clear(&self) { self.toasts.lock().clear() }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, toast: Toast) { self.toasts.lock().push(toast); }
}

/// Confirmation prompt shown before destructive actions.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way.
#[derive(Clone, Copy, Debug)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool { self.0 }
}

/// Spinner flag. Held true while at least one [`LoadingGuard`] is alive.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicUsize>);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool { self.0.load(Ordering::SeqCst) > 0 }

    pub fn begin(&self) -> LoadingGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(self.0.clone())
    }
}

/// Releases its hold on the flag when dropped, on success and error paths alike.
#[must_use = "the loading flag clears as soon as the guard is dropped"]
pub struct LoadingGuard(Arc<AtomicUsize>);

impl Drop for LoadingGuard {
    fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}
