/*!
 * # Content Anchors
 *
 * Comments are attached to text by **content**, not by offset. An [`Anchor`]
 * stores the selected text together with up to [`CONTEXT_CHARS`] characters of
 * context on either side. When the document changes, [`find_anchor_position`]
 * relocates the selection:
 *
 * - no occurrence of the selected text: `None` (the comment is orphaned)
 * - exactly one occurrence: that occurrence, whatever its context
 * - several occurrences: the one whose surrounding text best matches the stored
 *   context, scored by [`MatchWeights`]; ties go to the earliest occurrence
 *
 * All offsets are **character offsets** (Unicode scalar values), so context
 * windows are independent of UTF-8 encoding width.
 *
 * ```rust
 * use annotext_engine::anchoring::{create_anchor, find_anchor_position, TextRange};
 *
 * let doc = "Hello world, this is a test document.";
 * let anchor = create_anchor(doc, 13, 17).unwrap();
 * assert_eq!(anchor.exact, "this");
 *
 * let edited = "Well. Hello world, this is a test document.";
 * assert_eq!(
 *     find_anchor_position(edited, &anchor),
 *     Some(TextRange { from: 19, to: 23 })
 * );
 * ```
 */

mod scoring;

pub use scoring::MatchWeights;

use serde::{Deserialize, Serialize};

/// Number of context characters kept on each side of the selected text
pub const CONTEXT_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnchorError {
    #[error("Invalid range: start {from} is after end {to}")]
    InvertedRange { from: usize, to: usize },

    #[error("Range end {to} is past the end of the document ({len} characters)")]
    OutOfBounds { to: usize, len: usize },
}

/// Position-independent description of a selected text range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    /// Text immediately before the selection, at most [`CONTEXT_CHARS`] long
    pub prefix: String,
    /// The selected text itself
    pub exact: String,
    /// Text immediately after the selection, at most [`CONTEXT_CHARS`] long
    pub suffix: String,
}

/// Half-open character range `from..to` within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Capture the text between character offsets `from` and `to` as an anchor.
///
/// Context is clipped to [`CONTEXT_CHARS`] and to the document boundaries, so
/// `from == 0` always yields an empty prefix. Empty selections are allowed.
pub fn create_anchor(document: &str, from: usize, to: usize) -> Result<Anchor, AnchorError> {
    if from > to {
        return Err(AnchorError::InvertedRange { from, to });
    }

    let len = document.chars().count();
    if to > len {
        return Err(AnchorError::OutOfBounds { to, len });
    }

    // Offsets were validated above, so every lookup lands inside the document
    let at = |char_offset: usize| byte_offset(document, char_offset).unwrap_or(document.len());

    let prefix_start = at(from.saturating_sub(CONTEXT_CHARS));
    let exact_start = at(from);
    let exact_end = at(to);
    let suffix_end = at((to + CONTEXT_CHARS).min(len));

    Ok(Anchor {
        prefix: document[prefix_start..exact_start].to_string(),
        exact: document[exact_start..exact_end].to_string(),
        suffix: document[exact_end..suffix_end].to_string(),
    })
}

/// Relocate `anchor` in `document` using the default [`MatchWeights`]
pub fn find_anchor_position(document: &str, anchor: &Anchor) -> Option<TextRange> {
    find_anchor_position_with(document, anchor, &MatchWeights::default())
}

/// Relocate `anchor` in `document`, scoring ambiguous matches with `weights`.
///
/// The selected text is searched literally; it is never interpreted as a
/// pattern. When several occurrences exist the best-scoring one is returned
/// even if none of the stored context matches.
pub fn find_anchor_position_with(
    document: &str,
    anchor: &Anchor,
    weights: &MatchWeights,
) -> Option<TextRange> {
    if document.is_empty() {
        return None;
    }

    let candidates = occurrences(document, &anchor.exact);

    let best_start = match candidates.as_slice() {
        [] => return None,
        [only] => *only,
        [first, ..] => {
            let mut best = *first;
            let mut best_score = f64::NEG_INFINITY;
            for &start in &candidates {
                let end = start + anchor.exact.len();
                let score = weights.score(&document[..start], &document[end..], anchor);
                // Strictly greater keeps the earliest candidate on ties
                if score > best_score {
                    best = start;
                    best_score = score;
                }
            }
            best
        }
    };

    let from = document[..best_start].chars().count();
    Some(TextRange {
        from,
        to: from + anchor.exact.chars().count(),
    })
}

/// Byte offsets of every occurrence of `needle`, overlapping ones included.
///
/// An empty needle occurs at every character boundary.
fn occurrences(haystack: &str, needle: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut pos = 0;
    while let Some(found) = haystack[pos..].find(needle) {
        let start = pos + found;
        starts.push(start);
        // Resume one character later so "aa" is found twice in "aaa"
        match haystack[start..].chars().next() {
            Some(next) => pos = start + next.len_utf8(),
            None => break,
        }
    }
    starts
}

/// Byte offset of the character boundary at `char_offset`, which may equal the
/// character count to address the end of the text
fn byte_offset(text: &str, char_offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}
