//! The open document and its derived display values.
//!
//! ## Learning: Derived State as Functions
//!
//! The display name, display path and window title all depend only on
//! `path` and `dirty`. Computing them on read means there is no cached value
//! that could go stale when a field changes.

use std::path::{Path, PathBuf};

/// Name shown for a document that has never been saved.
pub const UNTITLED: &str = "Untitled";

/// The single document owned by a [`FileStore`](crate::FileStore).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Backing file (None for untitled documents)
    pub(crate) path: Option<PathBuf>,

    /// Full text content
    pub(crate) content: String,

    /// Content differs from what was last loaded or saved
    pub(crate) dirty: bool,

    /// A write is in flight
    pub(crate) saving: bool,

    /// Last failure, empty when the last operation succeeded
    pub(crate) error: String,
}

impl Document {
    /// Creates an empty untitled document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    /// Last path segment, or "Untitled".
    pub fn display_name(&self) -> String {
        display_name(self.path())
    }

    /// Full path, or "Untitled".
    pub fn display_path(&self) -> String {
        self.path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Window title with a dirty marker.
    pub fn title(&self, app_name: &str) -> String {
        title(&self.display_name(), self.dirty, app_name)
    }

    /// Replaces the content. Returns true if the text changed.
    pub(crate) fn set_content(&mut self, content: String) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content;
        self.dirty = true;
        true
    }

    /// Adopts freshly loaded text as the clean state.
    pub(crate) fn load(&mut self, path: PathBuf, content: String) {
        self.path = Some(path);
        self.content = content;
        self.dirty = false;
        self.error.clear();
    }
}

/// Last segment of `path`, or "Untitled" when there is none.
pub fn display_name(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Formats a window title: `"• name — App"` when dirty, `"name — App"` otherwise.
pub fn title(name: &str, dirty: bool, app_name: &str) -> String {
    if dirty {
        format!("\u{2022} {name} \u{2014} {app_name}")
    } else {
        format!("{name} \u{2014} {app_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untitled_document() {
        let doc = Document::new();
        assert_eq!(doc.display_name(), "Untitled");
        assert_eq!(doc.display_path(), "Untitled");
        assert_eq!(doc.title("Himark"), "Untitled \u{2014} Himark");
    }

    #[test]
    fn test_display_name_is_last_segment() {
        let mut doc = Document::new();
        doc.load(PathBuf::from("/docs/notes/a.md"), "hello".into());
        assert_eq!(doc.display_name(), "a.md");
        assert_eq!(doc.display_path(), "/docs/notes/a.md");
    }

    #[test]
    fn test_dirty_title_has_marker() {
        assert_eq!(title("a.md", true, "Himark"), "\u{2022} a.md \u{2014} Himark");
        assert_eq!(title("a.md", false, "Himark"), "a.md \u{2014} Himark");
    }

    #[test]
    fn test_set_content_marks_dirty_only_on_change() {
        let mut doc = Document::new();
        doc.load(PathBuf::from("/docs/a.md"), "hello".into());

        assert!(!doc.set_content("hello".into()));
        assert!(!doc.is_dirty());

        assert!(doc.set_content("hello world".into()));
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_load_clears_dirty_and_error() {
        let mut doc = Document::new();
        doc.dirty = true;
        doc.error = "boom".into();

        doc.load(PathBuf::from("/docs/b.md"), "text".into());

        assert!(!doc.is_dirty());
        assert!(doc.error().is_empty());
        assert_eq!(doc.path(), Some(Path::new("/docs/b.md")));
    }
}
