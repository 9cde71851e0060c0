//! Interactive console session.
//!
//! One task owns the store. It waits on two sources at once: lines typed by
//! the user and watch notices from the open file. Whichever arrives first is
//! handled to completion before the next wait, so the store never sees
//! overlapping operations.

use std::path::PathBuf;

use himark_core::command::{HELP, ParseError};
use himark_core::store::NoticeReceiver;
use himark_core::{
    Command, Config, ConfirmOptions, EventHandler, FileStore, NoticeOutcome, Prompt,
    StoreEvent, StoreOptions, complete_link,
};

use crate::console::ConsoleHost;

/// Whether the session keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    store: FileStore<ConsoleHost>,
    notices: NoticeReceiver,
    completion: bool,
}

impl Session {
    /// Builds the store and opens `initial_file` if one was given.
    pub async fn start(host: ConsoleHost, config: &Config, initial_file: Option<PathBuf>) -> Self {
        let (store, notices) = FileStore::new(host, StoreOptions::from(config));
        spawn_event_printer(EventHandler::new(store.subscribe()));

        let mut session = Self {
            store,
            notices,
            completion: config.completion.enabled,
        };
        if let Some(path) = initial_file {
            session.store.open_path(path).await;
        }
        session
    }

    pub fn store(&self) -> &FileStore<ConsoleHost> {
        &self.store
    }

    /// Runs until `quit` or end of input.
    pub async fn run(&mut self) {
        println!("{} (type `help` for commands)", self.store.title());

        loop {
            tokio::select! {
                line = self.store.host().next_line() => {
                    let Some(line) = line else { break };
                    if self.dispatch_line(&line).await == Flow::Quit {
                        break;
                    }
                }
                Some(notice) = self.notices.recv() => {
                    let outcome = self.store.handle_notice(notice).await;
                    tracing::debug!("Watch notice handled: {:?}", outcome);
                    if outcome == NoticeOutcome::Declined {
                        println!("Keeping the in-memory version.");
                    }
                }
            }
        }

        tracing::info!("Session ended");
    }

    /// Parses and performs one line of input.
    pub async fn dispatch_line(&mut self, line: &str) -> Flow {
        match Command::parse(line) {
            Ok(command) => self.dispatch(command).await,
            Err(ParseError::Empty) => Flow::Continue,
            Err(err) => {
                println!("{err}");
                Flow::Continue
            }
        }
    }

    pub async fn dispatch(&mut self, command: Command) -> Flow {
        match command {
            Command::Open { path: Some(path) } => self.store.open_path(path).await,
            Command::Open { path: None } => self.store.open().await,
            Command::Save => {
                self.store.save().await;
            }
            Command::SaveAs { path: Some(path) } => {
                self.store.save_to(path).await;
            }
            Command::SaveAs { path: None } => {
                self.store.save_as().await;
            }
            Command::Close => self.store.close(),
            Command::Quit => return self.confirm_quit().await,
            Command::Help => println!("{HELP}"),
            Command::Append { text } => {
                let mut content = self.store.content().to_string();
                if !content.is_empty() && !content.ends_with('\n') {
                    content.push('\n');
                }
                content.push_str(&text);
                content.push('\n');
                self.store.set_content(content);
            }
            Command::Replace { text } => self.store.set_content(text),
            Command::Show => print!("{}", self.store.content()),
            Command::Status => self.print_status(),
            Command::Complete { text } => self.print_completions(&text).await,
        }
        Flow::Continue
    }

    async fn confirm_quit(&self) -> Flow {
        if !self.store.is_dirty() {
            return Flow::Quit;
        }
        let options = ConfirmOptions::warning("Unsaved changes");
        let message = format!("{} has unsaved changes. Quit anyway?", self.store.display_name());
        match self.store.host().confirm(&message, &options).await {
            Ok(true) => Flow::Quit,
            Ok(false) => Flow::Continue,
            Err(err) => {
                tracing::warn!("Quit prompt failed: {}", err);
                Flow::Continue
            }
        }
    }

    fn print_status(&self) {
        println!("{}", self.store.display_path());
        println!(
            "  {}{}",
            if self.store.is_dirty() { "modified" } else { "saved" },
            if self.store.is_watching() { ", watching" } else { "" }
        );
        if !self.store.error().is_empty() {
            println!("  error: {}", self.store.error());
        }
    }

    async fn print_completions(&self, text: &str) {
        if !self.completion {
            println!("Link completion is disabled.");
            return;
        }
        match complete_link(self.store.path(), text, true).await {
            Some(result) => {
                for option in &result.options {
                    println!("  {}", option.label);
                }
            }
            None => println!("No completions."),
        }
    }
}

/// Prints store events as short status lines.
fn spawn_event_printer(mut handler: EventHandler) {
    use himark_core::document::display_name;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            match event {
                StoreEvent::Opened(path) => println!("Opened {}", display_name(Some(&path))),
                StoreEvent::Saved(path) => println!("Saved {}", display_name(Some(&path))),
                StoreEvent::Reloaded(path) => println!("Reloaded {}", display_name(Some(&path))),
                StoreEvent::Closed => println!("Closed"),
                StoreEvent::Failed(message) => println!("Error: {message}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    fn scripted(lines: &[String]) -> ConsoleHost {
        let (tx, rx) = mpsc::unbounded_channel();
        for line in lines {
            tx.send(line.clone()).unwrap();
        }
        ConsoleHost::new(rx)
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.files.watch = false;
        config
    }

    #[tokio::test]
    async fn test_edit_and_save_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "hello").unwrap();

        let host = scripted(&["append world".to_string(), "save".to_string(), "quit".to_string()]);
        let mut session = Session::start(host, &quiet_config(), Some(path.clone())).await;
        session.run().await;

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\nworld\n");
        assert!(!session.store().is_dirty());
    }

    #[tokio::test]
    async fn test_save_as_prompts_for_path() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("draft");

        let host = scripted(&[
            "set # Draft".to_string(),
            "save".to_string(),
            target.display().to_string(),
        ]);
        let mut session = Session::start(host, &quiet_config(), None).await;
        session.run().await;

        let saved = dir.path().join("draft.md");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "# Draft");
        assert_eq!(session.store().path(), Some(saved.as_path()));
    }

    #[tokio::test]
    async fn test_quit_with_unsaved_changes_asks() {
        let host = scripted(&["n".to_string(), "y".to_string()]);
        let mut session = Session::start(host, &quiet_config(), None).await;

        assert_eq!(session.dispatch_line("set unsaved").await, Flow::Continue);
        assert_eq!(session.dispatch(Command::Quit).await, Flow::Continue);
        assert_eq!(session.store().content(), "unsaved");
        assert_eq!(session.dispatch(Command::Quit).await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_unknown_command_continues() {
        let host = scripted(&[]);
        let mut session = Session::start(host, &quiet_config(), None).await;

        assert_eq!(session.dispatch_line("frobnicate").await, Flow::Continue);
        assert_eq!(session.dispatch_line("").await, Flow::Continue);
        assert_eq!(session.dispatch_line("quit").await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_failed_open_reports_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.md");

        let host = scripted(&[]);
        let mut session = Session::start(host, &quiet_config(), Some(missing)).await;

        assert!(session.store().error().contains("missing.md"));
        assert_eq!(session.dispatch(Command::Status).await, Flow::Continue);
        assert_eq!(session.store().path(), None);
    }
}
