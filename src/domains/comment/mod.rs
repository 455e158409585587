// Comment domain - threaded replies on echoes

pub mod service;
pub mod tree;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{CommentId, EchoId, UserId};
use crate::domains::user::UserSummary;

pub use service::CommentService;
pub use tree::{build_forest, build_thread, materialize_position};

/// A stored comment. `depth` and `path` are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: EchoId,
    pub user_id: UserId,
    pub description: String,
    pub parent_comment_id: Option<CommentId>,
    pub depth: u32,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment row joined with its author, as read back for display
#[derive(Debug, Clone, PartialEq)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: UserSummary,
}

/// A comment with its full reply subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
    /// Set when the comment's parent could not be placed in the tree
    pub orphaned: bool,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }
}

/// Insert payload handed to the store once depth and path are computed
#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: CommentId,
    pub post_id: EchoId,
    pub user_id: UserId,
    pub description: String,
    pub parent_comment_id: Option<CommentId>,
    pub depth: u32,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            user_id: self.user_id,
            description: self.description,
            parent_comment_id: self.parent_comment_id,
            depth: self.depth,
            path: self.path,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
