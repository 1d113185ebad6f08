use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Caret location as shown by the editor (0-based)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Viewport scroll offsets, which may be fractional
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub top: f64,
    pub left: f64,
}

impl ScrollPosition {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// One immutable point in a file's edit history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub cursor: CursorPosition,
    pub scroll: ScrollPosition,
}

impl Snapshot {
    /// Capture `content` now
    pub fn new(content: impl Into<String>, cursor: CursorPosition, scroll: ScrollPosition) -> Self {
        Self::at(now_millis(), content, cursor, scroll)
    }

    pub fn at(
        timestamp: u64,
        content: impl Into<String>,
        cursor: CursorPosition,
        scroll: ScrollPosition,
    ) -> Self {
        Self {
            content: content.into(),
            timestamp,
            cursor,
            scroll,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
