//! In-memory host for store tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::host::{ConfirmOptions, FileDialogs, FileFilter, FileIo, FileWatcher, Prompt, WindowTitle};
use crate::watch::{Subscription, WatchCallback, WatchEventKind, WatchOptions};
use crate::{CoreError, CoreResult};

struct MockWatch {
    callback: WatchCallback,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct MockState {
    files: HashMap<PathBuf, String>,
    open_answers: VecDeque<Option<PathBuf>>,
    save_answers: VecDeque<Option<PathBuf>>,
    confirm_answers: VecDeque<bool>,
    confirms: Vec<String>,
    writes: Vec<(PathBuf, String)>,
    failing_writes: HashSet<PathBuf>,
    fail_dialogs: bool,
    fail_prompt: bool,
    fail_subscribe: bool,
    fail_title: bool,
    watches: Vec<MockWatch>,
    titles: Vec<String>,
}

/// Scripted host: files live in a map, dialogs and prompts pop queued answers.
#[derive(Default)]
pub(crate) struct MockHost {
    state: Mutex<MockState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.set_file(path, text);
        self
    }

    pub fn set_file(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.lock().files.insert(path.into(), text.into());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.lock().files.remove(path.as_ref());
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    pub fn answer_open(&self, path: Option<&str>) {
        self.lock().open_answers.push_back(path.map(PathBuf::from));
    }

    pub fn answer_save(&self, path: Option<&str>) {
        self.lock().save_answers.push_back(path.map(PathBuf::from));
    }

    pub fn answer_confirm(&self, answer: bool) {
        self.lock().confirm_answers.push_back(answer);
    }

    pub fn fail_write(&self, path: impl Into<PathBuf>) {
        self.lock().failing_writes.insert(path.into());
    }

    pub fn fail_dialogs(&self) {
        self.lock().fail_dialogs = true;
    }

    pub fn fail_prompt(&self) {
        self.lock().fail_prompt = true;
    }

    pub fn fail_subscribe(&self) {
        self.lock().fail_subscribe = true;
    }

    pub fn fail_title(&self) {
        self.lock().fail_title = true;
    }

    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.lock().writes.clone()
    }

    /// Number of reload prompts shown.
    pub fn confirms(&self) -> usize {
        self.lock().confirms.len()
    }

    pub fn last_title(&self) -> Option<String> {
        self.lock().titles.last().cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.lock().watches.len()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .watches
            .iter()
            .filter(|w| w.active.load(Ordering::SeqCst))
            .count()
    }

    /// Delivers an event through the most recent subscription's callback.
    ///
    /// The callback runs even if that subscription was stopped, like a
    /// backend event that was already in flight.
    pub fn fire(&self, kind: WatchEventKind) {
        let state = self.lock();
        if let Some(watch) = state.watches.last() {
            (watch.callback)(kind);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

fn not_found() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory")
}

impl FileDialogs for MockHost {
    async fn pick_open_file(&self, _filters: &[FileFilter]) -> CoreResult<Option<PathBuf>> {
        let mut state = self.lock();
        if state.fail_dialogs {
            return Err(CoreError::Dialog("no display available".to_string()));
        }
        Ok(state.open_answers.pop_front().flatten())
    }

    async fn pick_save_file(&self, _filters: &[FileFilter]) -> CoreResult<Option<PathBuf>> {
        let mut state = self.lock();
        if state.fail_dialogs {
            return Err(CoreError::Dialog("no display available".to_string()));
        }
        Ok(state.save_answers.pop_front().flatten())
    }
}

impl FileIo for MockHost {
    async fn read_text(&self, path: &Path) -> CoreResult<String> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::Read {
                path: path.to_path_buf(),
                source: not_found(),
            })
    }

    async fn write_text(&self, path: &Path, text: &str) -> CoreResult<()> {
        let mut state = self.lock();
        if state.failing_writes.contains(path) {
            return Err(CoreError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied"),
            });
        }
        state.writes.push((path.to_path_buf(), text.to_string()));
        state.files.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}

impl FileWatcher for MockHost {
    async fn subscribe(
        &self,
        path: &Path,
        _options: WatchOptions,
        on_event: WatchCallback,
    ) -> CoreResult<Subscription> {
        let mut state = self.lock();
        if state.fail_subscribe {
            return Err(CoreError::WatchSubscribe {
                path: path.to_path_buf(),
                reason: "watch limit reached".to_string(),
            });
        }

        let active = Arc::new(AtomicBool::new(true));
        state.watches.push(MockWatch {
            callback: on_event,
            active: Arc::clone(&active),
        });
        Ok(Subscription::new(move || active.store(false, Ordering::SeqCst)))
    }
}

impl Prompt for MockHost {
    async fn confirm(&self, message: &str, _options: &ConfirmOptions) -> CoreResult<bool> {
        let mut state = self.lock();
        state.confirms.push(message.to_string());
        if state.fail_prompt {
            return Err(CoreError::Prompt("prompt dismissed by host".to_string()));
        }
        Ok(state.confirm_answers.pop_front().unwrap_or(false))
    }
}

impl WindowTitle for MockHost {
    fn set_window_title(&self, title: &str) -> CoreResult<()> {
        let mut state = self.lock();
        if state.fail_title {
            return Err(CoreError::Title("no window".to_string()));
        }
        state.titles.push(title.to_string());
        Ok(())
    }
}
