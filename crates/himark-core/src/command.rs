//! Commands a host can send to the store.
//!
//! ## Learning: The Command Pattern
//!
//! Commands encapsulate actions as values:
//! - Menu items, key bindings and typed input all map to the same enum
//! - The session loop has one place that performs them
//! - Parsing is testable without a store

use std::path::PathBuf;

/// Actions available in a Himark session.
///
/// The file commands mirror the native File menu; the rest drive the
/// document from a console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // File menu
    Open { path: Option<PathBuf> },
    Save,
    SaveAs { path: Option<PathBuf> },
    Close,
    Quit,

    // Help menu
    Help,

    // Editing
    Append { text: String },
    Replace { text: String },

    // Inspection
    Show,
    Status,
    Complete { text: String },
}

impl Command {
    /// Parses one line of console input.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let (word, rest) = match line.trim_start().split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim_start()),
            None => (line.trim(), ""),
        };
        let path = || (!rest.trim().is_empty()).then(|| PathBuf::from(rest.trim()));

        let command = match word {
            "" => return Err(ParseError::Empty),
            "open" | "o" => Command::Open { path: path() },
            "save" | "w" => Command::Save,
            "saveas" | "save-as" => Command::SaveAs { path: path() },
            "close" => Command::Close,
            "quit" | "q" | "exit" => Command::Quit,
            "help" | "?" => Command::Help,
            "append" | "a" => Command::Append {
                text: rest.to_string(),
            },
            "set" => Command::Replace {
                text: rest.replace("\\n", "\n"),
            },
            "show" | "p" => Command::Show,
            "status" => Command::Status,
            "complete" => Command::Complete {
                text: rest.to_string(),
            },
            other => {
                return Command::from_menu_id(other)
                    .ok_or_else(|| ParseError::Unknown(other.to_string()));
            }
        };
        Ok(command)
    }

    /// Maps a native menu item id to its command.
    pub fn from_menu_id(id: &str) -> Option<Self> {
        match id {
            "open" => Some(Command::Open { path: None }),
            "save" => Some(Command::Save),
            "save_as" => Some(Command::SaveAs { path: None }),
            "close" => Some(Command::Close),
            "quit" => Some(Command::Quit),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Reference shown by the `help` command.
pub const HELP: &str = "\
Commands:
  open [PATH]      open a file (asks when PATH is omitted)     Ctrl+O
  save             save the document                           Ctrl+S
  saveas [PATH]    save to a new file                          Ctrl+Shift+S
  close            close the document                          Ctrl+W
  quit             leave Himark                                Ctrl+Q
  append TEXT      append a line to the document
  set TEXT         replace the document (\\n for newlines)
  show             print the document
  status           print path, dirty flag and last error
  complete TEXT    complete a link target, e.g. `complete [a](no`
  help             show this help                              F1";

/// Errors from [`Command::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
}
