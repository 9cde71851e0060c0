//! Services the file store depends on.
//!
//! ## Learning: Traits as Seams
//!
//! The store is generic over a [`Host`] instead of calling `tokio::fs` or a
//! dialog crate directly. Production code plugs in native services, tests plug
//! in an in-memory host. Because the store is driven from a single task, the
//! traits use plain `async fn` and do not require `Send` futures.

#![allow(async_fn_in_trait)]

use std::path::{Path, PathBuf};

use crate::CoreResult;
use crate::watch::{Subscription, WatchCallback, WatchOptions};

/// A named group of file extensions offered by a file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

impl FileFilter {
    pub const fn new(name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self { name, extensions }
    }

    /// Returns true if `path` passes this filter.
    ///
    /// `*` accepts everything; otherwise the extension is compared
    /// case-insensitively.
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.contains(&"*") {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
    }
}

/// Filters shown by the open dialog.
pub const OPEN_FILTERS: &[FileFilter] = &[
    FileFilter::new("Markdown", &["md", "markdown", "txt"]),
    FileFilter::new("All Files", &["*"]),
];

/// Filters shown by the save dialog.
pub const SAVE_FILTERS: &[FileFilter] = &[FileFilter::new("Markdown", &["md", "markdown"])];

/// Severity shown with a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptKind {
    #[default]
    Info,
    Warning,
    Error,
}

/// Presentation options for [`Prompt::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOptions {
    pub title: String,
    pub kind: PromptKind,
}

impl ConfirmOptions {
    pub fn warning(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: PromptKind::Warning,
        }
    }
}

/// File pickers. `Ok(None)` means the user cancelled.
pub trait FileDialogs {
    async fn pick_open_file(&self, filters: &[FileFilter]) -> CoreResult<Option<PathBuf>>;

    async fn pick_save_file(&self, filters: &[FileFilter]) -> CoreResult<Option<PathBuf>>;
}

/// Whole-file text I/O.
pub trait FileIo {
    async fn read_text(&self, path: &Path) -> CoreResult<String>;

    async fn write_text(&self, path: &Path, text: &str) -> CoreResult<()>;
}

/// Filesystem change notifications for a single path.
pub trait FileWatcher {
    /// Starts delivering debounced events for `path` to `on_event`.
    ///
    /// Events stop once the returned [`Subscription`] is unsubscribed.
    async fn subscribe(
        &self,
        path: &Path,
        options: WatchOptions,
        on_event: WatchCallback,
    ) -> CoreResult<Subscription>;
}

/// Yes/no questions to the user.
pub trait Prompt {
    async fn confirm(&self, message: &str, options: &ConfirmOptions) -> CoreResult<bool>;
}

/// Native window chrome title. Best effort.
pub trait WindowTitle {
    fn set_window_title(&self, title: &str) -> CoreResult<()>;
}

/// Everything a [`FileStore`](crate::FileStore) needs from its environment.
pub trait Host: FileDialogs + FileIo + FileWatcher + Prompt + WindowTitle {}

impl<T> Host for T where T: FileDialogs + FileIo + FileWatcher + Prompt + WindowTitle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_extensions() {
        let markdown = &OPEN_FILTERS[0];
        assert!(markdown.matches(Path::new("/docs/a.md")));
        assert!(markdown.matches(Path::new("/docs/A.MARKDOWN")));
        assert!(markdown.matches(Path::new("notes.txt")));
        assert!(!markdown.matches(Path::new("image.png")));
        assert!(!markdown.matches(Path::new("README")));
    }

    #[test]
    fn test_wildcard_filter_matches_everything() {
        let all = &OPEN_FILTERS[1];
        assert!(all.matches(Path::new("README")));
        assert!(all.matches(Path::new("image.png")));
    }

    #[test]
    fn test_save_filters_are_markdown_only() {
        assert_eq!(SAVE_FILTERS.len(), 1);
        assert!(!SAVE_FILTERS[0].matches(Path::new("a.txt")));
        assert!(SAVE_FILTERS[0].matches(Path::new("a.md")));
    }
}
