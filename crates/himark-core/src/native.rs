//! Native file I/O and file watching.
//!
//! ## Learning: Bridging Sync Callbacks into Async
//!
//! `notify` calls its event handler on a background thread. The handler only
//! pushes the event kind into an unbounded `tokio` channel (sending never
//! blocks), and a spawned task owns the debounce timer. This keeps all timing
//! logic inside the runtime, where `tokio::time` can be paused in tests.

use std::path::Path;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::host::{FileIo, FileWatcher};
use crate::watch::{Subscription, WatchCallback, WatchEventKind, WatchOptions};
use crate::{CoreError, CoreResult};

/// Reads and writes files with `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFileIo;

impl FileIo for NativeFileIo {
    async fn read_text(&self, path: &Path) -> CoreResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CoreError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write_text(&self, path: &Path, text: &str) -> CoreResult<()> {
        tokio::fs::write(path, text)
            .await
            .map_err(|source| CoreError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Watches single files with the platform's recommended `notify` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatcher;

impl FileWatcher for NotifyWatcher {
    async fn subscribe(
        &self,
        path: &Path,
        options: WatchOptions,
        on_event: WatchCallback,
    ) -> CoreResult<Subscription> {
        let watch_error = |err: notify::Error| CoreError::WatchSubscribe {
            path: path.to_path_buf(),
            reason: err.to_string(),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    // Receiver is gone once the subscription is torn down
                    let _ = tx.send(WatchEventKind::from(&event.kind));
                }
                Err(err) => tracing::warn!("Watch backend error: {}", err),
            })
            .map_err(watch_error)?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;

        let task = tokio::spawn(debounce(rx, options, on_event));
        tracing::debug!("Watching {}", path.display());

        Ok(Subscription::new(move || {
            drop(watcher);
            task.abort();
        }))
    }
}

/// Coalesces raw events into one callback per window.
///
/// The window opens at the first event of a burst and is not extended by
/// later ones, so a file that is written without pause still gets a callback
/// every `options.debounce`. The callback gets the strongest kind seen.
pub(crate) async fn debounce(
    mut rx: mpsc::UnboundedReceiver<WatchEventKind>,
    options: WatchOptions,
    on_event: WatchCallback,
) {
    while let Some(first) = rx.recv().await {
        let mut kind = first;
        let deadline = Instant::now() + options.debounce;

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                next = rx.recv() => match next {
                    Some(next) => kind = kind.merge(next),
                    None => break,
                },
            }
        }

        on_event(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::tempdir;

    fn recorder() -> (Arc<Mutex<Vec<WatchEventKind>>>, WatchCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: WatchCallback = Box::new(move |kind| sink.lock().unwrap().push(kind));
        (seen, callback)
    }

    #[tokio::test]
    async fn test_read_write_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.md");

        NativeFileIo.write_text(&path, "# Title\n").await.unwrap();
        let text = NativeFileIo.read_text(&path).await.unwrap();

        assert_eq!(text, "# Title\n");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.md");

        let err = NativeFileIo.read_text(&path).await.unwrap_err();

        assert!(matches!(err, CoreError::Read { .. }));
        assert!(err.to_string().contains("missing.md"));
    }

    #[tokio::test]
    async fn test_write_into_missing_dir_is_write_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("note.md");

        let err = NativeFileIo.write_text(&path, "x").await.unwrap_err();

        assert!(matches!(err, CoreError::Write { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_burst() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (seen, callback) = recorder();
        let options = WatchOptions {
            debounce: Duration::from_millis(200),
        };
        let task = tokio::spawn(debounce(rx, options, callback));

        tx.send(WatchEventKind::Access).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(WatchEventKind::Modify).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(WatchEventKind::Access).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(*seen.lock().unwrap(), vec![WatchEventKind::Modify]);

        tx.send(WatchEventKind::Remove).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![WatchEventKind::Modify, WatchEventKind::Remove]
        );

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_reports_continuous_writes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (seen, callback) = recorder();
        let options = WatchOptions {
            debounce: Duration::from_millis(200),
        };
        let task = tokio::spawn(debounce(rx, options, callback));

        // A writer that never pauses for a full window
        for _ in 0..10 {
            tx.send(WatchEventKind::Modify).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let delivered = seen.lock().unwrap().len();
        assert!(delivered >= 3, "expected a notice per window, got {delivered}");
        assert!(seen.lock().unwrap().iter().all(|k| *k == WatchEventKind::Modify));

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_missing_path_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.md");
        let (_seen, callback) = recorder();

        let err = NotifyWatcher
            .subscribe(&path, WatchOptions::default(), callback)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::WatchSubscribe { .. }));
    }
}
