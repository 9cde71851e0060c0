//! Watch subscriptions and notices.
//!
//! ## Learning: Cancellation Without Locks
//!
//! A watcher callback runs on whatever thread the backend chooses, while the
//! subscription is torn down from the store's task. Instead of locking, each
//! subscription owns an `Arc<AtomicBool>`. The callback captures a clone of it
//! at subscribe time and checks it before doing anything; stopping the handle
//! flips the flag first and only then unsubscribes. A callback that is already
//! running when the stop happens sees the flag on its next check.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Kind of a filesystem change, as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WatchEventKind {
    /// Pure read or open access
    Access,
    /// Anything else (creation, metadata-less events, unknown)
    Other,
    /// Content or metadata modification
    Modify,
    /// File was removed
    Remove,
}

impl WatchEventKind {
    /// Coalesces two kinds observed in the same debounce window.
    ///
    /// The stronger kind wins: `Remove` > `Modify` > `Other` > `Access`.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns true if this kind can mean the file content changed.
    pub fn is_change(self) -> bool {
        matches!(self, WatchEventKind::Modify | WatchEventKind::Remove)
    }
}

impl From<&notify::EventKind> for WatchEventKind {
    fn from(kind: &notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Access(_) => WatchEventKind::Access,
            notify::EventKind::Modify(_) => WatchEventKind::Modify,
            notify::EventKind::Remove(_) => WatchEventKind::Remove,
            notify::EventKind::Create(_) | notify::EventKind::Any | notify::EventKind::Other => {
                WatchEventKind::Other
            }
        }
    }
}

/// Options passed to a watcher when subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Quiet period used to coalesce bursts of raw events
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
        }
    }
}

/// Callback invoked by a watcher for every debounced event.
pub type WatchCallback = Box<dyn Fn(WatchEventKind) + Send + Sync + 'static>;

/// Identifies one subscription of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A debounced change notification forwarded to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchNotice {
    pub subscription: SubscriptionId,
    pub path: PathBuf,
    pub kind: WatchEventKind,
    /// When the watcher delivered the event, not when the store handles it
    pub at: Instant,
}

/// Teardown returned by a [`FileWatcher`](crate::host::FileWatcher).
///
/// Wraps the backend-specific unsubscribe action. It runs at most once.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Runs the unsubscribe action if it has not run yet.
    pub fn unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Shared cancellation flag for one subscription.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The store's handle on its active watch subscription.
#[derive(Debug)]
pub struct WatchHandle {
    id: SubscriptionId,
    path: PathBuf,
    cancelled: CancelFlag,
    subscription: Option<Subscription>,
}

impl WatchHandle {
    /// Creates a handle that has not been installed yet.
    ///
    /// The flag is created here so the callback can capture it before the
    /// backend subscription exists.
    pub fn pending(path: PathBuf) -> Self {
        Self {
            id: SubscriptionId::next(),
            path,
            cancelled: CancelFlag::new(),
            subscription: None,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Clone of the flag for capture by the watch callback.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancelled.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// Installs the backend subscription once setup has resolved.
    ///
    /// If the handle was stopped while setup was pending, the subscription is
    /// torn down right away and `false` is returned.
    pub fn install(&mut self, mut subscription: Subscription) -> bool {
        if self.is_cancelled() {
            subscription.unsubscribe();
            return false;
        }
        self.subscription = Some(subscription);
        true
    }

    /// Stops the subscription. Idempotent.
    pub fn stop(&mut self) {
        self.cancelled.cancel();
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
