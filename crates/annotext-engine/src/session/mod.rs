//! Session file schema.
//!
//! One JSON document per workspace holds the open-file state, every comment
//! and, while autosave is off, each file's snapshot history:
//!
//! ```json
//! {
//!   "version": 1,
//!   "folderName": "notes",
//!   "lastModified": 1700000000000,
//!   "session": { "openFiles": ["a.md"], "activeFile": "a.md", "autosave": false },
//!   "comments": [],
//!   "fileHistory": { "a.md": { "snapshots": [], "currentIndex": -1 } }
//! }
//! ```
//!
//! Older files without `fileHistory` (or `comments`, or `session`) load with
//! empty defaults.

use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::comments::{Comment, CommentStore};
use crate::history::{FileHistory, HistoryConfig, HistoryManager, now_millis};

/// Newest session format this build reads and writes
pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to read session file at {session_path}: {source}")]
    Read {
        session_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid session JSON: {source}")]
    Json { source: serde_json::Error },

    #[error("Session file version {found} is newer than this build supports")]
    UnsupportedVersion { found: u32 },
}

/// Editor layout restored when a workspace is reopened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub open_files: Vec<RelativePathBuf>,
    #[serde(default)]
    pub active_file: Option<RelativePathBuf>,
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

fn default_autosave() -> bool {
    true
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            open_files: Vec::new(),
            active_file: None,
            autosave: default_autosave(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub version: u32,
    pub folder_name: String,
    /// Milliseconds since the Unix epoch
    pub last_modified: u64,
    #[serde(default)]
    pub session: SessionState,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub file_history: BTreeMap<RelativePathBuf, FileHistory>,
}

impl SessionDocument {
    pub fn new(folder_name: impl Into<String>) -> Self {
        Self {
            version: SESSION_VERSION,
            folder_name: folder_name.into(),
            last_modified: now_millis(),
            session: SessionState::default(),
            comments: Vec::new(),
            file_history: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let document: Self =
            serde_json::from_str(json).map_err(|source| SessionError::Json { source })?;
        if document.version > SESSION_VERSION {
            return Err(SessionError::UnsupportedVersion {
                found: document.version,
            });
        }
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(self).map_err(|source| SessionError::Json { source })
    }

    /// Load a session file, or `None` when it does not exist yet
    pub fn load_from_path<P: AsRef<Path>>(session_path: P) -> Result<Option<Self>, SessionError> {
        let session_path = session_path.as_ref();
        if !session_path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(session_path).map_err(|source| SessionError::Read {
            session_path: session_path.to_path_buf(),
            source,
        })?;

        Self::from_json(&json).map(Some)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, session_path: P) -> anyhow::Result<()> {
        let session_path = session_path.as_ref();
        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(session_path, self.to_json()?)?;
        log::debug!("Saved session to {}", session_path.display());
        Ok(())
    }

    /// Mark the document as modified now
    pub fn touch(&mut self) {
        self.last_modified = now_millis();
    }

    /// Build a live history manager from the persisted histories
    pub fn history_manager(&self, config: HistoryConfig) -> HistoryManager {
        HistoryManager::from_histories(self.file_history.clone(), config)
    }

    pub fn store_history(&mut self, history: &HistoryManager) {
        self.file_history = history.histories().clone();
        self.touch();
    }

    /// Replace the persisted history of `file` alone, leaving every other
    /// file's history as it was loaded
    pub fn store_file_history(&mut self, history: &HistoryManager, file: &RelativePath) {
        match history.history(file) {
            Some(file_history) => {
                self.file_history
                    .insert(file.to_relative_path_buf(), file_history.clone());
            }
            None => {
                self.file_history.remove(file);
            }
        }
        self.touch();
    }

    /// Snapshot history is only kept while autosave is off
    pub fn keeps_history(&self) -> bool {
        !self.session.autosave
    }

    pub fn comment_store(&self) -> CommentStore {
        CommentStore::from_comments(self.comments.clone())
    }

    pub fn store_comments(&mut self, store: &CommentStore) {
        self.comments = store.comments().to_vec();
        self.touch();
    }

    /// Switch autosave on or off.
    ///
    /// Turning autosave back on hands durability back to the file system, so
    /// every snapshot history is dropped, both live and persisted.
    pub fn set_autosave(&mut self, enabled: bool, history: &mut HistoryManager) {
        let resuming = enabled && !self.session.autosave;
        self.session.autosave = enabled;
        if resuming {
            log::debug!("Autosave re-enabled, discarding snapshot histories");
            history.clear_all_histories();
            self.file_history.clear();
        }
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::create_anchor;
    use crate::history::{CursorPosition, ScrollPosition, Snapshot};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_session() -> SessionDocument {
        let doc = "Hello world, this is a test document.";
        let mut session = SessionDocument::new("notes");
        session.last_modified = 1_000;
        session.session.open_files = vec![RelativePathBuf::from("a.md")];
        session.session.active_file = Some(RelativePathBuf::from("a.md"));
        session.session.autosave = false;
        session.comments.push(Comment {
            id: "c1".to_string(),
            file_relative_path: RelativePathBuf::from("a.md"),
            user_id: "ana".to_string(),
            anchor: create_anchor(doc, 13, 17).unwrap(),
            timestamp: 500,
            resolved: false,
            thread: Vec::new(),
        });

        let mut history = HistoryManager::new();
        history.push_snapshot(
            RelativePath::new("a.md"),
            Snapshot::at(
                900,
                doc,
                CursorPosition::new(0, 13),
                ScrollPosition::default(),
            ),
        );
        session.file_history = history.into_histories();
        session
    }

    #[test]
    fn test_wire_shape() {
        let json = sample_session().to_json().unwrap();

        insta::assert_snapshot!(json, @r#"
        {
          "version": 1,
          "folderName": "notes",
          "lastModified": 1000,
          "session": {
            "openFiles": [
              "a.md"
            ],
            "activeFile": "a.md",
            "autosave": false
          },
          "comments": [
            {
              "id": "c1",
              "fileRelativePath": "a.md",
              "userId": "ana",
              "anchor": {
                "prefix": "Hello world, ",
                "exact": "this",
                "suffix": " is a test document."
              },
              "timestamp": 500,
              "resolved": false,
              "thread": []
            }
          ],
          "fileHistory": {
            "a.md": {
              "snapshots": [
                {
                  "content": "Hello world, this is a test document.",
                  "timestamp": 900,
                  "cursor": {
                    "line": 0,
                    "column": 13
                  },
                  "scroll": {
                    "top": 0.0,
                    "left": 0.0
                  }
                }
              ],
              "currentIndex": 0
            }
          }
        }
        "#);
    }

    #[test]
    fn test_parses_back_to_same_document() {
        let session = sample_session();

        let parsed = SessionDocument::from_json(&session.to_json().unwrap()).unwrap();

        assert_eq!(parsed, session);
    }

    #[test]
    fn test_missing_optional_sections_default_to_empty() {
        let json = r#"{"version":1,"folderName":"notes","lastModified":5}"#;

        let session = SessionDocument::from_json(json).unwrap();

        assert!(session.file_history.is_empty());
        assert!(session.comments.is_empty());
        assert_eq!(session.session, SessionState::default());
        assert!(session.session.autosave);
    }

    #[test]
    fn test_rejects_newer_version() {
        let json = r#"{"version":2,"folderName":"notes","lastModified":5}"#;

        let error = SessionDocument::from_json(json).unwrap_err();

        assert!(matches!(
            error,
            SessionError::UnsupportedVersion { found: 2 }
        ));
    }

    #[test]
    fn test_rejects_corrupt_history_index() {
        let json = r#"{"version":1,"folderName":"n","lastModified":5,
            "fileHistory":{"a.md":{"snapshots":[],"currentIndex":3}}}"#;

        let error = SessionDocument::from_json(json).unwrap_err();

        assert!(matches!(error, SessionError::Json { .. }));
        assert!(error.to_string().contains("currentIndex 3"));
    }

    #[test]
    fn test_history_manager_resumes_from_session() {
        let session = sample_session();

        let history = session.history_manager(HistoryConfig::default());

        let current = history.current_snapshot(RelativePath::new("a.md")).unwrap();
        assert_eq!(current.timestamp, 900);
    }

    #[test]
    fn test_store_history_and_comments_update_document() {
        let mut session = SessionDocument::new("notes");
        let mut history = HistoryManager::new();
        history.create_snapshot(
            RelativePath::new("b.md"),
            "text",
            CursorPosition::default(),
            ScrollPosition::default(),
        );
        let mut comments = CommentStore::new();
        comments
            .attach(RelativePath::new("b.md"), "ana", "text", 0, 4, "note")
            .unwrap();

        session.store_history(&history);
        session.store_comments(&comments);

        assert_eq!(session.file_history.len(), 1);
        assert_eq!(session.comment_store(), comments);
    }

    #[test]
    fn test_store_file_history_leaves_other_files_alone() {
        let mut session = sample_session();
        let mut history = HistoryManager::new();
        history.create_snapshot(
            RelativePath::new("b.md"),
            "second file",
            CursorPosition::default(),
            ScrollPosition::default(),
        );

        session.store_file_history(&history, RelativePath::new("b.md"));

        assert_eq!(session.file_history.len(), 2);
        assert_eq!(
            session.file_history[RelativePath::new("a.md")].len(),
            sample_session().file_history[RelativePath::new("a.md")].len()
        );
        assert_eq!(
            session.file_history[RelativePath::new("b.md")]
                .current()
                .unwrap()
                .content,
            "second file"
        );
    }

    #[test]
    fn test_store_file_history_drops_cleared_file() {
        let mut session = sample_session();
        let mut history = session.history_manager(HistoryConfig::default());
        history.clear_history(RelativePath::new("a.md"));

        session.store_file_history(&history, RelativePath::new("a.md"));

        assert!(session.file_history.is_empty());
    }

    #[test]
    fn test_history_kept_only_while_autosave_is_off() {
        let mut session = SessionDocument::new("notes");
        assert!(!session.keeps_history());

        session.session.autosave = false;

        assert!(session.keeps_history());
    }

    #[test]
    fn test_reenabling_autosave_clears_histories() {
        let mut session = sample_session();
        let mut history = session.history_manager(HistoryConfig::default());

        session.set_autosave(true, &mut history);

        assert!(session.session.autosave);
        assert_eq!(history.file_count(), 0);
        assert!(session.file_history.is_empty());
    }

    #[test]
    fn test_disabling_autosave_keeps_histories() {
        let mut session = sample_session();
        session.session.autosave = true;
        let mut history = session.history_manager(HistoryConfig::default());

        session.set_autosave(false, &mut history);

        assert!(!session.session.autosave);
        assert_eq!(history.file_count(), 1);
        assert_eq!(session.file_history.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();

        let loaded = SessionDocument::load_from_path(temp_dir.path().join("nope.json")).unwrap();

        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let session_path = temp_dir.path().join(".annotext").join("session.json");
        let session = sample_session();

        session.save_to_path(&session_path).unwrap();
        let loaded = SessionDocument::load_from_path(&session_path)
            .unwrap()
            .unwrap();

        assert_eq!(loaded, session);
    }
}
