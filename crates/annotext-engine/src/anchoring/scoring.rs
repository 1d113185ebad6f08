use serde::{Deserialize, Serialize};

use super::{Anchor, CONTEXT_CHARS};

/// Scores used to choose between several occurrences of an anchor's text.
///
/// Following context counts for more than preceding context, and a full
/// context match counts for more than any partial one. The exact magnitudes
/// are tunable; [`MatchWeights::is_ordered`] checks the relative ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchWeights {
    /// Awarded when the text after a candidate starts with the stored suffix
    pub exact_suffix: f64,
    /// Awarded per leading suffix character that matches otherwise
    pub suffix_char: f64,
    /// Awarded when the text before a candidate ends with the stored prefix
    pub exact_prefix: f64,
    /// Awarded per trailing prefix character that matches otherwise
    pub prefix_char: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            exact_suffix: 100.0,
            suffix_char: 1.0,
            exact_prefix: 50.0,
            prefix_char: 0.5,
        }
    }
}

impl MatchWeights {
    /// Check that suffix outranks prefix and that an exact match outranks the
    /// best possible partial match on the same side
    pub fn is_ordered(&self) -> bool {
        let window = CONTEXT_CHARS as f64;
        self.prefix_char >= 0.0
            && self.suffix_char > self.prefix_char
            && self.exact_suffix > self.exact_prefix
            && self.exact_suffix > self.suffix_char * window
            && self.exact_prefix > self.prefix_char * window
    }

    /// Score a candidate given the document text before and after it
    pub(crate) fn score(&self, before: &str, after: &str, anchor: &Anchor) -> f64 {
        self.suffix_score(after, &anchor.suffix) + self.prefix_score(before, &anchor.prefix)
    }

    fn suffix_score(&self, after: &str, suffix: &str) -> f64 {
        if suffix.is_empty() {
            return 0.0;
        }
        if after.starts_with(suffix) {
            return self.exact_suffix;
        }
        let matching = after
            .chars()
            .zip(suffix.chars())
            .take_while(|(actual, stored)| actual == stored)
            .count();
        matching as f64 * self.suffix_char
    }

    fn prefix_score(&self, before: &str, prefix: &str) -> f64 {
        if prefix.is_empty() {
            return 0.0;
        }
        if before.ends_with(prefix) {
            return self.exact_prefix;
        }
        let matching = before
            .chars()
            .rev()
            .zip(prefix.chars().rev())
            .take_while(|(actual, stored)| actual == stored)
            .count();
        matching as f64 * self.prefix_char
    }
}
