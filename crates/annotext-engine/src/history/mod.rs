//! Snapshot-based undo/redo history, kept per file.
//!
//! [`HistoryManager`] owns one [`FileHistory`] per workspace-relative path.
//! Each history is a linear stack of full-content [`Snapshot`]s with a current
//! position; recording after an undo discards the redo branch. Histories are
//! unbounded unless [`HistoryConfig::max_snapshots`] is set.
//!
//! [`SnapshotTimer`] samples the active editor on a fixed interval and records
//! a snapshot only when the content changed.

mod file_history;
mod snapshot;
mod timer;

pub use file_history::{FileHistory, HistoryError};
pub use snapshot::{CursorPosition, ScrollPosition, Snapshot, now_millis};
pub use timer::{DEFAULT_SNAPSHOT_INTERVAL, SnapshotTimer, StateAccessor, TickOutcome};

use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Opt-in cap on snapshots kept per file; `None` keeps everything
    pub max_snapshots: Option<usize>,
}

/// Editor state for the active file, as reported by the editing surface
#[derive(Debug, Clone, PartialEq)]
pub struct FileState {
    pub file_path: RelativePathBuf,
    pub content: String,
    pub cursor: CursorPosition,
    pub scroll: ScrollPosition,
}

/// Per-file snapshot histories for one workspace
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    histories: BTreeMap<RelativePathBuf, FileHistory>,
    config: HistoryConfig,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            histories: BTreeMap::new(),
            config,
        }
    }

    /// Resume from histories loaded out of a session file
    pub fn from_histories(
        histories: BTreeMap<RelativePathBuf, FileHistory>,
        config: HistoryConfig,
    ) -> Self {
        Self { histories, config }
    }

    pub fn into_histories(self) -> BTreeMap<RelativePathBuf, FileHistory> {
        self.histories
    }

    pub fn histories(&self) -> &BTreeMap<RelativePathBuf, FileHistory> {
        &self.histories
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    pub fn history(&self, file_path: &RelativePath) -> Option<&FileHistory> {
        self.histories.get(file_path)
    }

    pub fn current_snapshot(&self, file_path: &RelativePath) -> Option<&Snapshot> {
        self.history(file_path).and_then(FileHistory::current)
    }

    /// Number of files with a history
    pub fn file_count(&self) -> usize {
        self.histories.len()
    }

    /// Record the given state as a new snapshot timestamped now
    pub fn create_snapshot(
        &mut self,
        file_path: &RelativePath,
        content: impl Into<String>,
        cursor: CursorPosition,
        scroll: ScrollPosition,
    ) -> &Snapshot {
        self.push_snapshot(file_path, Snapshot::new(content, cursor, scroll))
    }

    /// Append an already-built snapshot to a file's history, creating the
    /// history on first use
    pub fn push_snapshot(&mut self, file_path: &RelativePath, snapshot: Snapshot) -> &Snapshot {
        let max_snapshots = self.config.max_snapshots;
        let history = self
            .histories
            .entry(file_path.to_relative_path_buf())
            .or_default();
        let recorded = history.push(snapshot, max_snapshots);
        log::debug!(
            "Recorded snapshot for {file_path} ({} bytes)",
            recorded.content.len()
        );
        recorded
    }

    /// Record `state` unless its content equals the snapshot at the current
    /// position. Returns whether a snapshot was added.
    pub fn record_if_changed(&mut self, state: FileState) -> bool {
        let unchanged = self
            .current_snapshot(&state.file_path)
            .is_some_and(|current| current.content == state.content);
        if unchanged {
            return false;
        }

        self.create_snapshot(&state.file_path, state.content, state.cursor, state.scroll);
        true
    }

    pub fn undo(&mut self, file_path: &RelativePath) -> Option<&Snapshot> {
        self.histories.get_mut(file_path)?.undo()
    }

    pub fn redo(&mut self, file_path: &RelativePath) -> Option<&Snapshot> {
        self.histories.get_mut(file_path)?.redo()
    }

    pub fn can_undo(&self, file_path: &RelativePath) -> bool {
        self.history(file_path).is_some_and(FileHistory::can_undo)
    }

    pub fn can_redo(&self, file_path: &RelativePath) -> bool {
        self.history(file_path).is_some_and(FileHistory::can_redo)
    }

    /// Drop a file's history entirely, returning it if there was one
    pub fn clear_history(&mut self, file_path: &RelativePath) -> Option<FileHistory> {
        let removed = self.histories.remove(file_path);
        if removed.is_some() {
            log::debug!("Cleared history for {file_path}");
        }
        removed
    }

    pub fn clear_all_histories(&mut self) {
        log::debug!("Clearing history for {} file(s)", self.histories.len());
        self.histories.clear();
    }
}
