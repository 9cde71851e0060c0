//! # Himark Core
//!
//! File lifecycle and editor support logic for the Himark Markdown editor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        FileStore                          │
//! │  ┌────────────┐  ┌─────────────┐  ┌────────────────────┐ │
//! │  │  Document  │  │ WatchHandle │  │      EventBus      │ │
//! │  └────────────┘  └─────────────┘  └────────────────────┘ │
//! │         │               │                                 │
//! │  ┌──────┴───────────────┴──────────────────────────────┐ │
//! │  │                       Host                           │ │
//! │  │  dialogs · file io · watcher · prompt · window title │ │
//! │  └──────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The store never touches the filesystem or the user directly. Every side
//! effect goes through a [`Host`], which keeps the lifecycle logic testable
//! against an in-memory host.
//!
//! ## Learning: Module Organization
//!
//! Rust modules map to files:
//! - `mod foo;` looks for `foo.rs` or `foo/mod.rs`
//! - `pub use` re-exports items for cleaner public APIs

pub mod command;
pub mod completion;
pub mod config;
pub mod document;
pub mod event;
pub mod host;
pub mod native;
pub mod store;
pub mod theme;
pub mod watch;

#[cfg(test)]
pub(crate) mod mock;

use std::path::PathBuf;

pub use command::Command;
pub use completion::{Completion, CompletionKind, CompletionResult, complete_link};
pub use config::{Config, ConfigError};
pub use document::Document;
pub use event::{EventBus, EventHandler, StoreEvent};
pub use host::{
    ConfirmOptions, FileDialogs, FileFilter, FileIo, FileWatcher, Host, Prompt, PromptKind,
    WindowTitle,
};
pub use native::{NativeFileIo, NotifyWatcher};
pub use store::{FileStore, NoticeOutcome, PersistOutcome, StoreOptions};
pub use theme::{Theme, ThemeMode};
pub use watch::{Subscription, WatchEventKind, WatchHandle, WatchNotice, WatchOptions};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to watch {}: {reason}", .path.display())]
    WatchSubscribe { path: PathBuf, reason: String },

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Window title error: {0}")]
    Title(String),
}
