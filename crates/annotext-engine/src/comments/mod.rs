use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchoring::{
    Anchor, AnchorError, MatchWeights, TextRange, create_anchor, find_anchor_position_with,
};
use crate::history::now_millis;

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Comment not found: {0}")]
    NotFound(String),
    #[error("Cannot anchor comment in {file}: {source}")]
    Anchor {
        file: RelativePathBuf,
        source: AnchorError,
    },
}

/// One message in a comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub user_id: String,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// A discussion thread attached to a range of a file by content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub file_relative_path: RelativePathBuf,
    pub user_id: String,
    pub anchor: Anchor,
    pub timestamp: u64,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub thread: Vec<Reply>,
}

impl Comment {
    /// Start a new thread with `text` as its first message
    pub fn new(
        file_relative_path: RelativePathBuf,
        user_id: impl Into<String>,
        anchor: Anchor,
        text: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        let timestamp = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            file_relative_path,
            thread: vec![Reply {
                user_id: user_id.clone(),
                text: text.into(),
                timestamp,
            }],
            user_id,
            anchor,
            timestamp,
            resolved: false,
        }
    }
}

/// Where a comment sits in the current text of its file
#[derive(Debug, Clone, PartialEq)]
pub enum CommentPlacement<'a> {
    Anchored {
        comment: &'a Comment,
        range: TextRange,
    },
    /// The anchored text no longer exists in the file
    Orphaned { comment: &'a Comment },
}

impl<'a> CommentPlacement<'a> {
    pub fn comment(&self) -> &'a Comment {
        match self {
            Self::Anchored { comment, .. } | Self::Orphaned { comment } => comment,
        }
    }

    pub fn range(&self) -> Option<TextRange> {
        match self {
            Self::Anchored { range, .. } => Some(*range),
            Self::Orphaned { .. } => None,
        }
    }
}

/// All comments of a workspace, in creation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentStore {
    comments: Vec<Comment>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_comments(comments: Vec<Comment>) -> Self {
        Self { comments }
    }

    pub fn into_comments(self) -> Vec<Comment> {
        self.comments
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn add(&mut self, comment: Comment) -> &Comment {
        self.comments.push(comment);
        &self.comments[self.comments.len() - 1]
    }

    /// Anchor a new comment on `from..to` of `document` and store it
    pub fn attach(
        &mut self,
        file: &RelativePath,
        user_id: &str,
        document: &str,
        from: usize,
        to: usize,
        text: &str,
    ) -> Result<&Comment, CommentError> {
        let anchor = create_anchor(document, from, to).map_err(|source| {
            log::warn!("Rejected comment range {from}..{to} in {file}: {source}");
            CommentError::Anchor {
                file: file.to_relative_path_buf(),
                source,
            }
        })?;
        Ok(self.add(Comment::new(
            file.to_relative_path_buf(),
            user_id,
            anchor,
            text,
        )))
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Comment, CommentError> {
        self.comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or_else(|| CommentError::NotFound(id.to_string()))
    }

    /// Append a message to a comment's thread
    pub fn reply(&mut self, id: &str, user_id: &str, text: &str) -> Result<(), CommentError> {
        self.get_mut(id)?.thread.push(Reply {
            user_id: user_id.to_string(),
            text: text.to_string(),
            timestamp: now_millis(),
        });
        Ok(())
    }

    pub fn set_resolved(&mut self, id: &str, resolved: bool) -> Result<(), CommentError> {
        self.get_mut(id)?.resolved = resolved;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Comment> {
        let index = self.comments.iter().position(|comment| comment.id == id)?;
        Some(self.comments.remove(index))
    }

    pub fn for_file<'a>(&'a self, file: &'a RelativePath) -> impl Iterator<Item = &'a Comment> {
        self.comments
            .iter()
            .filter(move |comment| comment.file_relative_path.as_relative_path() == file)
    }

    /// Resolve every comment of `file` against its current `document` text
    pub fn locate<'a>(
        &'a self,
        file: &'a RelativePath,
        document: &str,
        weights: &MatchWeights,
    ) -> Vec<CommentPlacement<'a>> {
        self.for_file(file)
            .map(
                |comment| match find_anchor_position_with(document, &comment.anchor, weights) {
                    Some(range) => CommentPlacement::Anchored { comment, range },
                    None => {
                        log::debug!("Comment {} in {file} is orphaned", comment.id);
                        CommentPlacement::Orphaned { comment }
                    }
                },
            )
            .collect()
    }
}
