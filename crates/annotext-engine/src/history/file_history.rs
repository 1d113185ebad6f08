use serde::{Deserialize, Serialize};

use super::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("currentIndex {index} is out of range for {len} snapshot(s)")]
    IndexOutOfRange { index: i64, len: usize },
}

/// Ordered snapshots of one file plus the position undo/redo moves through.
///
/// `current_index` is `None` when there is no position, which is written as
/// `-1` in session files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredFileHistory", into = "StoredFileHistory")]
pub struct FileHistory {
    snapshots: Vec<Snapshot>,
    current_index: Option<usize>,
}

/// Session file representation of a [`FileHistory`]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFileHistory {
    snapshots: Vec<Snapshot>,
    current_index: i64,
}

impl TryFrom<StoredFileHistory> for FileHistory {
    type Error = HistoryError;

    fn try_from(stored: StoredFileHistory) -> Result<Self, Self::Error> {
        let len = stored.snapshots.len();
        let current_index = match stored.current_index {
            -1 => None,
            index if index >= 0 && (index as usize) < len => Some(index as usize),
            index => return Err(HistoryError::IndexOutOfRange { index, len }),
        };
        Ok(Self {
            snapshots: stored.snapshots,
            current_index,
        })
    }
}

impl From<FileHistory> for StoredFileHistory {
    fn from(history: FileHistory) -> Self {
        Self {
            current_index: history.current_index.map_or(-1, |index| index as i64),
            snapshots: history.snapshots,
        }
    }
}

impl FileHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// The snapshot the editor is currently showing, if any
    pub fn current(&self) -> Option<&Snapshot> {
        self.current_index.and_then(|index| self.snapshots.get(index))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.current_index, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.redo_target().is_some()
    }

    /// Append a snapshot after the current position.
    ///
    /// Anything after the current position is discarded first, so a new edit
    /// after an undo drops the redo branch. With `max_snapshots` set the oldest
    /// snapshots are evicted to stay within the cap.
    pub fn push(&mut self, snapshot: Snapshot, max_snapshots: Option<usize>) -> &Snapshot {
        let keep = self.current_index.map_or(0, |index| index + 1);
        if keep < self.snapshots.len() {
            log::debug!(
                "Discarding {} redo snapshot(s) after index {keep}",
                self.snapshots.len() - keep
            );
            self.snapshots.truncate(keep);
        }

        self.snapshots.push(snapshot);

        if let Some(max) = max_snapshots
            && self.snapshots.len() > max.max(1)
        {
            let excess = self.snapshots.len() - max.max(1);
            log::debug!("Evicting {excess} oldest snapshot(s) to stay within {max}");
            self.snapshots.drain(..excess);
        }

        let last = self.snapshots.len() - 1;
        self.current_index = Some(last);
        &self.snapshots[last]
    }

    /// Step back one snapshot; `None` when already at the earliest
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let index = self.current_index.filter(|&index| index > 0)? - 1;
        self.current_index = Some(index);
        self.snapshots.get(index)
    }

    /// Step forward one snapshot; `None` when already at the latest
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let index = self.redo_target()?;
        self.current_index = Some(index);
        self.snapshots.get(index)
    }

    fn redo_target(&self) -> Option<usize> {
        let next = self.current_index.map_or(0, |index| index + 1);
        (next < self.snapshots.len()).then_some(next)
    }
}
