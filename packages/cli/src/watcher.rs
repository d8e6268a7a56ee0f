use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Cannot watch {}: not a file path", .0.display())]
    InvalidPath(PathBuf),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Watches a single file. The parent directory is watched so editors that
/// save by renaming a temporary file are still noticed.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: UnboundedReceiver<notify::Result<Event>>,
    file_name: std::ffi::OsString,
}

impl FileWatcher {
    pub fn new(file: &Path) -> WatcherResult<Self> {
        let file_name = file
            .file_name()
            .ok_or_else(|| WatcherError::InvalidPath(file.to_path_buf()))?
            .to_os_string();
        let dir = match file.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => return Err(WatcherError::InvalidPath(file.to_path_buf())),
        };

        let (tx, rx) = unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name,
        })
    }

    /// Wait for the next change to the watched file. `None` once the
    /// watcher has stopped.
    pub async fn next_change(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await? {
                Ok(event) if self.is_change(&event) => return Some(event),
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!("Watch error: {}", err);
                    continue;
                }
            }
        }
    }

    fn is_change(&self, event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
        ) && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(self.file_name.as_os_str()))
    }
}
