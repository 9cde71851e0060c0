//! The file store: one open document kept in sync with its file.
//!
//! ## Learning: Self-Inflicted Notifications
//!
//! Writing a file is itself visible to the file watcher. Without a guard,
//! every save would come back as "file changed on disk". The store stamps the
//! time right before each write (and again when the write succeeds) and
//! ignores notices the watcher delivered within the grace window after that
//! stamp. Each notice carries its delivery instant, so one that sat in the
//! queue while a command ran is judged by when it arrived.
//!
//! ## Thread Safety
//!
//! `FileStore` is owned by a single task. Watch callbacks run elsewhere and
//! only forward [`WatchNotice`]s over a channel; the owner feeds them back in
//! through [`FileStore::handle_notice`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use crate::config::Config;
use crate::document::Document;
use crate::event::{EventBus, StoreEvent};
use crate::host::{ConfirmOptions, Host, OPEN_FILTERS, SAVE_FILTERS};
use crate::watch::{
    CancelFlag, SubscriptionId, WatchCallback, WatchEventKind, WatchHandle, WatchNotice,
    WatchOptions,
};
use crate::CoreError;

/// Question asked when the open file changes underneath us.
pub const RELOAD_MESSAGE: &str = "The file was modified on disk. Do you want to reload it?";

/// Title of the reload prompt.
pub const RELOAD_TITLE: &str = "File changed on disk";

/// Receiving end for watch notices of one store.
pub type NoticeReceiver = mpsc::UnboundedReceiver<WatchNotice>;

/// Tunables for a [`FileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Suffix of the window title
    pub app_name: String,
    /// Watch the open file for external changes
    pub watch: bool,
    /// Debounce passed to the watcher
    pub watch_debounce: Duration,
    /// Notices within this window after a write are ignored
    pub self_write_grace: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            app_name: "Himark".to_string(),
            watch: true,
            watch_debounce: Duration::from_millis(200),
            self_write_grace: Duration::from_millis(500),
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            app_name: config.ui.app_name.clone(),
            watch: config.files.watch,
            watch_debounce: config.files.watch_debounce(),
            self_write_grace: config.files.self_write_grace(),
        }
    }
}

/// Result of [`FileStore::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The content was written
    Written,
    /// Nothing happened (no path, write already in flight, or dialog cancelled)
    Skipped,
    /// The write or its dialog failed; see [`FileStore::error`]
    Failed,
}

/// How a watch notice was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeOutcome {
    /// From a stopped or replaced subscription
    Stale,
    /// Inside the grace window after our own write
    SelfWrite,
    /// Not a modification or removal
    Ignored,
    /// The user kept the in-memory content
    Declined,
    /// The user asked to reload; the read may still have failed
    Reloaded,
}

/// Owns the open document and reconciles it with the filesystem.
pub struct FileStore<H: Host> {
    host: H,
    options: StoreOptions,
    doc: Document,

    /// Last title pushed to the sinks
    title: String,

    /// Stamp of the most recent write
    last_persist: Option<Instant>,

    /// Active watch subscription (at most one)
    watch: Option<WatchHandle>,

    notices: mpsc::UnboundedSender<WatchNotice>,
    events: EventBus,
}

impl<H: Host> FileStore<H> {
    /// Creates a store with an empty untitled document.
    ///
    /// The returned receiver yields watch notices; pass each one to
    /// [`handle_notice`](Self::handle_notice).
    pub fn new(host: H, options: StoreOptions) -> (Self, NoticeReceiver) {
        let (notices, rx) = mpsc::unbounded_channel();
        let mut store = Self {
            host,
            options,
            doc: Document::new(),
            title: String::new(),
            last_persist: None,
            watch: None,
            notices,
            events: EventBus::new(),
        };
        store.update_title();
        (store, rx)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn path(&self) -> Option<&Path> {
        self.doc.path()
    }

    pub fn content(&self) -> &str {
        self.doc.content()
    }

    pub fn is_dirty(&self) -> bool {
        self.doc.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.doc.is_saving()
    }

    pub fn error(&self) -> &str {
        self.doc.error()
    }

    /// The document title as last pushed to the sinks.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn display_name(&self) -> String {
        self.doc.display_name()
    }

    pub fn display_path(&self) -> String {
        self.doc.display_path()
    }

    /// Path of the active watch subscription, if any.
    pub fn watched_path(&self) -> Option<&Path> {
        self.watch.as_ref().map(WatchHandle::path)
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Subscribes to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Replaces the content from the editor side.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let was_dirty = self.doc.is_dirty();
        if self.doc.set_content(content.into()) && !was_dirty {
            self.update_title();
        }
    }

    /// Asks the user for a file and opens it.
    pub async fn open(&mut self) {
        match self.host.pick_open_file(OPEN_FILTERS).await {
            Ok(Some(path)) => self.open_path(path).await,
            Ok(None) => tracing::debug!("Open cancelled"),
            Err(err) => self.fail(err),
        }
    }

    /// Loads `path`, replacing the current document on success.
    ///
    /// Any existing watch is stopped first. On failure the previous path and
    /// content stay, the error is recorded and the previous path is watched
    /// again.
    pub async fn open_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.stop_watching();

        match self.host.read_text(&path).await {
            Ok(text) => {
                self.doc.load(path.clone(), text);
                tracing::info!("Opened {}", path.display());
                self.update_title();
                self.start_watching(path.clone()).await;
                self.events.emit(StoreEvent::Opened(path));
            }
            Err(err) => {
                self.fail(err);
                self.update_title();
                if let Some(previous) = self.doc.path.clone() {
                    self.start_watching(previous).await;
                }
            }
        }
    }

    /// Writes the content to its file, asking for a destination if untitled.
    pub async fn save(&mut self) -> PersistOutcome {
        match self.doc.path.clone() {
            Some(path) => {
                let data = self.doc.content.clone();
                self.persist(&path, &data).await
            }
            None => self.save_as().await,
        }
    }

    /// Asks for a destination and writes the content there.
    pub async fn save_as(&mut self) -> PersistOutcome {
        match self.host.pick_save_file(SAVE_FILTERS).await {
            Ok(Some(path)) => self.save_to(path).await,
            Ok(None) => {
                tracing::debug!("Save as cancelled");
                PersistOutcome::Skipped
            }
            Err(err) => {
                self.fail(err);
                PersistOutcome::Failed
            }
        }
    }

    /// Writes the content to `path` and adopts it as the document's path.
    ///
    /// The path is only adopted if the write happened and succeeded.
    pub async fn save_to(&mut self, path: impl Into<PathBuf>) -> PersistOutcome {
        let path = path.into();
        let data = self.doc.content.clone();
        let outcome = self.persist(&path, &data).await;
        if outcome != PersistOutcome::Written {
            return outcome;
        }

        let moved = self.doc.path.as_deref() != Some(path.as_path());
        if moved || self.watch.is_none() {
            self.doc.path = Some(path.clone());
            self.update_title();
            self.stop_watching();
            self.start_watching(path).await;
        }
        outcome
    }

    /// Single-flight write of `data` to `path`.
    ///
    /// Does nothing if `path` is empty or another write is in flight. The
    /// write stamp is taken before the I/O so that notices racing with the
    /// write fall inside the grace window.
    pub async fn persist(&mut self, path: &Path, data: &str) -> PersistOutcome {
        if path.as_os_str().is_empty() || self.doc.saving {
            tracing::debug!("Persist skipped for {:?}", path);
            return PersistOutcome::Skipped;
        }

        self.doc.saving = true;
        self.last_persist = Some(Instant::now());

        let outcome = match self.host.write_text(path, data).await {
            Ok(()) => {
                self.last_persist = Some(Instant::now());
                self.doc.dirty = false;
                self.doc.error.clear();
                tracing::info!("Saved {}", path.display());
                self.events.emit(StoreEvent::Saved(path.to_path_buf()));
                PersistOutcome::Written
            }
            Err(err) => {
                self.fail(err);
                PersistOutcome::Failed
            }
        };

        self.doc.saving = false;
        self.update_title();
        outcome
    }

    /// Stops watching and resets to an empty untitled document.
    pub fn close(&mut self) {
        self.stop_watching();
        self.doc = Document::new();
        self.update_title();
        tracing::info!("Closed document");
        self.events.emit(StoreEvent::Closed);
    }

    /// Pushes the current title to the document title and the window chrome.
    pub fn update_title(&mut self) {
        self.title = self.doc.title(&self.options.app_name);
        if let Err(err) = self.host.set_window_title(&self.title) {
            tracing::warn!("Failed to set window title: {}", err);
        }
    }

    /// Classifies a watch notice and reloads if the user agrees.
    pub async fn handle_notice(&mut self, notice: WatchNotice) -> NoticeOutcome {
        if !self.is_live(notice.subscription) {
            tracing::debug!("Dropping notice from stale subscription {}", notice.subscription);
            return NoticeOutcome::Stale;
        }

        if self.within_grace(notice.at) {
            tracing::debug!("Ignoring self-inflicted {:?} on {}", notice.kind, notice.path.display());
            return NoticeOutcome::SelfWrite;
        }

        if !notice.kind.is_change() {
            return NoticeOutcome::Ignored;
        }

        let options = ConfirmOptions::warning(RELOAD_TITLE);
        let reload = match self.host.confirm(RELOAD_MESSAGE, &options).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!("Reload prompt failed: {}", err);
                false
            }
        };

        if !reload {
            return NoticeOutcome::Declined;
        }

        // The prompt may have outlived the subscription
        if !self.is_live(notice.subscription) {
            return NoticeOutcome::Stale;
        }

        self.open_path(notice.path.clone()).await;
        if self.doc.error.is_empty() {
            self.events.emit(StoreEvent::Reloaded(notice.path));
        }
        NoticeOutcome::Reloaded
    }

    fn is_live(&self, id: SubscriptionId) -> bool {
        self.watch
            .as_ref()
            .is_some_and(|watch| watch.id() == id && !watch.is_cancelled())
    }

    /// Whether an event delivered at `delivered` falls inside the window
    /// after our last write. Queued notices keep their delivery time.
    fn within_grace(&self, delivered: Instant) -> bool {
        self.last_persist.is_some_and(|written| {
            delivered.saturating_duration_since(written) < self.options.self_write_grace
        })
    }

    fn fail(&mut self, err: CoreError) {
        tracing::warn!("{}", err);
        self.doc.error = err.to_string();
        self.events.emit(StoreEvent::Failed(self.doc.error.clone()));
    }

    fn stop_watching(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.stop();
            tracing::debug!("Stopped watching {}", watch.path().display());
        }
    }

    async fn start_watching(&mut self, path: PathBuf) {
        if !self.options.watch {
            return;
        }

        let mut handle = WatchHandle::pending(path.clone());
        let callback = notice_callback(
            handle.id(),
            path.clone(),
            handle.cancel_flag(),
            self.notices.clone(),
        );
        let options = WatchOptions {
            debounce: self.options.watch_debounce,
        };

        match self.host.subscribe(&path, options, callback).await {
            Ok(subscription) => {
                if handle.install(subscription) {
                    self.watch = Some(handle);
                }
            }
            Err(err) => {
                tracing::error!("Watch failed to start: {}", err);
            }
        }
    }
}

/// Builds the callback handed to the watcher for one subscription.
fn notice_callback(
    id: SubscriptionId,
    path: PathBuf,
    cancelled: CancelFlag,
    notices: mpsc::UnboundedSender<WatchNotice>,
) -> WatchCallback {
    Box::new(move |kind: WatchEventKind| {
        if cancelled.is_cancelled() {
            return;
        }
        let _ = notices.send(WatchNotice {
            subscription: id,
            path: path.clone(),
            kind,
            at: Instant::now(),
        });
    })
}
