//! File name completion inside Markdown link targets.
//!
//! When the cursor sits after `](`, the text typed so far is treated as a
//! path relative to the directory of the open file:
//!
//! ```text
//! See [notes](sub%20dir/rea|
//!             ^ from         ^ cursor
//! ```
//!
//! Candidates are read from disk and inserted percent-encoded so the link
//! stays a valid URL.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;

/// What a completion option points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    File,
    Directory,
}

/// One suggested link target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Text inserted at `from`, percent-encoded
    pub label: String,
    pub kind: CompletionKind,
}

/// Suggestions for the link target under the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    /// Byte offset in the input where the link target starts
    pub from: usize,
    pub options: Vec<Completion>,
    /// Options are already filtered; the editor should not filter again
    pub filter: bool,
}

/// The link target being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkQuery {
    /// Byte offset just after `](`
    pub from: usize,
    /// Raw text between `](` and the cursor
    pub partial: String,
}

/// Finds the link target being typed at the end of `before_cursor`.
///
/// Picks the earliest `](` whose tail contains neither `)` nor a newline.
/// A bare `](` only counts when completion was requested explicitly.
pub fn link_query(before_cursor: &str, explicit: bool) -> Option<LinkQuery> {
    let scan_from = before_cursor
        .rfind(&[')', '\n'][..])
        .map_or(0, |i| i + 1);
    let start = scan_from + before_cursor[scan_from..].find("](")?;
    let from = start + 2;
    let partial = &before_cursor[from..];

    if partial.is_empty() && !explicit {
        return None;
    }

    Some(LinkQuery {
        from,
        partial: partial.to_string(),
    })
}

/// Completes the link target at the end of `before_cursor`.
///
/// Returns `None` when there is no link context, no open file to resolve
/// against, nothing matches, or the directory cannot be read.
pub async fn complete_link(
    current_file: Option<&Path>,
    before_cursor: &str,
    explicit: bool,
) -> Option<CompletionResult> {
    let query = link_query(before_cursor, explicit)?;
    let base_dir = current_file?
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())?;

    let decoded = percent_decode(&query.partial).unwrap_or_else(|| query.partial.clone());
    let (dir_suffix, file_prefix) = match decoded.rfind('/') {
        Some(i) => (&decoded[..i], &decoded[i + 1..]),
        None => ("", decoded.as_str()),
    };

    let search_dir: PathBuf = if dir_suffix.is_empty() {
        base_dir.to_path_buf()
    } else {
        base_dir.join(dir_suffix)
    };
    let encoded_suffix = dir_suffix
        .split('/')
        .map(percent_encode)
        .collect::<Vec<_>>()
        .join("/");

    let entries = match list_dir(&search_dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!("Link completion skipped {}: {}", search_dir.display(), err);
            return None;
        }
    };

    let prefix = file_prefix.to_lowercase();
    let options: Vec<Completion> = entries
        .into_iter()
        .filter(|(name, _)| !name.is_empty() && !name.starts_with('.'))
        .filter(|(name, _)| name.to_lowercase().starts_with(&prefix))
        .map(|(name, is_dir)| {
            let slash = if is_dir { "/" } else { "" };
            let encoded = percent_encode(&name);
            let label = if encoded_suffix.is_empty() {
                format!("{encoded}{slash}")
            } else {
                format!("{encoded_suffix}/{encoded}{slash}")
            };
            Completion {
                label,
                kind: if is_dir {
                    CompletionKind::Directory
                } else {
                    CompletionKind::File
                },
            }
        })
        .collect();

    if options.is_empty() {
        return None;
    }

    Some(CompletionResult {
        from: query.from,
        options,
        filter: false,
    })
}

/// Lists `dir` as `(name, is_dir)` pairs sorted by name.
async fn list_dir(dir: &Path) -> std::io::Result<Vec<(String, bool)>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(entries)
}

/// Bytes escaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encodes like JavaScript's `encodeURIComponent`.
pub fn percent_encode(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Decodes `%XX` escapes. Returns `None` for malformed escapes or invalid UTF-8.
pub fn percent_decode(text: &str) -> Option<String> {
    // percent_decode_str passes bad escapes through; reject them instead
    let bytes = text.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, &byte)| {
        byte != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return None;
    }

    percent_decode_str(text)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
