//! Console implementation of the store's host services.
//!
//! Dialogs and prompts read from the same line queue as the session, so a
//! question asked in the middle of a command simply consumes the next line
//! typed by the user.

use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, mpsc};

use himark_core::host::{
    ConfirmOptions, FileDialogs, FileFilter, FileIo, FileWatcher, Prompt, PromptKind, WindowTitle,
};
use himark_core::watch::{Subscription, WatchCallback, WatchOptions};
use himark_core::{CoreError, CoreResult, NativeFileIo, NotifyWatcher};

/// Host that talks to the user through stdin/stdout.
pub struct ConsoleHost {
    input: Mutex<mpsc::UnboundedReceiver<String>>,
    io: NativeFileIo,
    watcher: NotifyWatcher,
    terminal_title: bool,
}

impl ConsoleHost {
    /// Creates a host reading lines from `input`.
    pub fn new(input: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            input: Mutex::new(input),
            io: NativeFileIo,
            watcher: NotifyWatcher,
            terminal_title: std::io::stderr().is_terminal(),
        }
    }

    /// Creates a host fed by the process's stdin.
    ///
    /// Lines are read on a plain thread: a blocking read inside the runtime
    /// would keep it from shutting down after `quit`.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::error!("Failed to read stdin: {}", err);
                        break;
                    }
                }
            }
        });
        Self::new(rx)
    }

    /// Waits for the next input line. `None` once input is closed.
    pub async fn next_line(&self) -> Option<String> {
        self.input.lock().await.recv().await
    }

    /// Prints `question` and waits for an answer. Empty answers and closed
    /// input both count as no answer.
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        print!("{question} ");
        std::io::stdout().flush()?;
        let answer = self.next_line().await;
        Ok(answer
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty()))
    }
}

fn dialog_failed(err: std::io::Error) -> CoreError {
    CoreError::Dialog(format!("console unavailable: {err}"))
}

fn prompt_failed(err: std::io::Error) -> CoreError {
    CoreError::Prompt(format!("console unavailable: {err}"))
}

fn describe(filters: &[FileFilter]) -> String {
    filters
        .iter()
        .map(|f| format!("{}: {}", f.name, f.extensions.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FileDialogs for ConsoleHost {
    async fn pick_open_file(&self, filters: &[FileFilter]) -> CoreResult<Option<PathBuf>> {
        let question = format!("Open file ({}), empty to cancel:", describe(filters));
        let answer = self.ask(&question).await.map_err(dialog_failed)?;
        Ok(answer.map(PathBuf::from))
    }

    async fn pick_save_file(&self, filters: &[FileFilter]) -> CoreResult<Option<PathBuf>> {
        let question = format!("Save as ({}), empty to cancel:", describe(filters));
        let Some(answer) = self.ask(&question).await.map_err(dialog_failed)? else {
            return Ok(None);
        };

        let mut path = PathBuf::from(answer);
        if path.extension().is_none() {
            if let Some(ext) = filters.first().and_then(|f| f.extensions.first()) {
                path.set_extension(ext);
            }
        } else if !filters.iter().any(|f| f.matches(&path)) {
            tracing::warn!("{} does not match the offered file types", path.display());
        }
        Ok(Some(path))
    }
}

impl FileIo for ConsoleHost {
    async fn read_text(&self, path: &Path) -> CoreResult<String> {
        self.io.read_text(path).await
    }

    async fn write_text(&self, path: &Path, text: &str) -> CoreResult<()> {
        self.io.write_text(path, text).await
    }
}

impl FileWatcher for ConsoleHost {
    async fn subscribe(
        &self,
        path: &Path,
        options: WatchOptions,
        on_event: WatchCallback,
    ) -> CoreResult<Subscription> {
        self.watcher.subscribe(path, options, on_event).await
    }
}

impl Prompt for ConsoleHost {
    async fn confirm(&self, message: &str, options: &ConfirmOptions) -> CoreResult<bool> {
        let marker = match options.kind {
            PromptKind::Info => "",
            PromptKind::Warning => "! ",
            PromptKind::Error => "!! ",
        };
        let question = format!("{marker}[{}] {message} [y/N]", options.title);
        let answer = self.ask(&question).await.map_err(prompt_failed)?;
        Ok(matches!(
            answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        ))
    }
}

impl WindowTitle for ConsoleHost {
    fn set_window_title(&self, title: &str) -> CoreResult<()> {
        if !self.terminal_title {
            return Ok(());
        }
        // OSC 0: set icon name and window title
        let mut stderr = std::io::stderr().lock();
        write!(stderr, "\x1b]0;{title}\x07")
            .and_then(|_| stderr.flush())
            .map_err(|err| CoreError::Title(err.to_string()))
    }
}
