pub mod anchoring;
pub mod comments;
pub mod history;
pub mod io;
pub mod session;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use anchoring::{
    Anchor, AnchorError, MatchWeights, TextRange, create_anchor, find_anchor_position,
    find_anchor_position_with,
};
pub use comments::{Comment, CommentError, CommentPlacement, CommentStore, Reply};
pub use history::{
    CursorPosition, FileHistory, FileState, HistoryConfig, HistoryError, HistoryManager,
    ScrollPosition, Snapshot, SnapshotTimer, TickOutcome,
};
pub use io::IoError;
pub use session::{SessionDocument, SessionError, SessionState};
