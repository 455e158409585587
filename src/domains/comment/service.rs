// CommentService - posting comments and reading them back as trees

use std::sync::Arc;

use tracing::{info, instrument};

use super::{build_forest, build_thread, materialize_position, Comment, CommentNode, NewComment};
use crate::config::LimitsConfig;
use crate::core::strong_types::{CommentId, EchoId};
use crate::core::{current_time_millis, datetime_from_millis};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::id_generator::IdGenerator;
use crate::infrastructure::viewer::ViewerContext;

#[derive(Clone)]
pub struct CommentService {
    db: Arc<dyn DatabaseInterface>,
    ids: Arc<IdGenerator>,
    limits: LimitsConfig,
}

impl CommentService {
    pub fn new(db: Arc<dyn DatabaseInterface>, ids: Arc<IdGenerator>, limits: LimitsConfig) -> Self {
        Self { db, ids, limits }
    }

    /// Post a root comment, or a reply when `parent_comment_id` is given.
    /// Depth and path are derived from the parent here and never change.
    /// The body is validated with surrounding whitespace ignored but stored
    /// as given.
    #[instrument(skip(self, vc, description), fields(request_id = %vc.request_id))]
    pub async fn post_comment(
        &self,
        vc: &ViewerContext,
        post_id: EchoId,
        description: &str,
        parent_comment_id: Option<CommentId>,
    ) -> AppResult<Comment> {
        let user_id = vc.require_user()?;

        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidArgument(
                "Comment description must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > self.limits.max_comment_length {
            return Err(AppError::InvalidArgument(format!(
                "Comment description exceeds {} characters",
                self.limits.max_comment_length
            )));
        }

        let (echo_exists, author_exists) =
            futures::try_join!(self.db.echo_exists(post_id), self.db.user_exists(user_id))?;
        if !echo_exists {
            return Err(AppError::NotFound(format!("Echo {} not found", post_id)));
        }
        if !author_exists {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let parent = match parent_comment_id {
            Some(parent_id) => {
                let parent = self
                    .db
                    .get_comment(parent_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Parent comment {} not found", parent_id)))?;
                if parent.post_id != post_id {
                    return Err(AppError::InvalidArgument(format!(
                        "Parent comment {} belongs to echo {}, not {}",
                        parent_id, parent.post_id, post_id
                    )));
                }
                Some(parent)
            }
            None => None,
        };

        let (depth, path) = materialize_position(post_id, parent.as_ref());
        if depth > self.limits.max_comment_depth {
            return Err(AppError::InvalidArgument(format!(
                "Replies cannot be nested deeper than {} levels",
                self.limits.max_comment_depth
            )));
        }
        let new_comment = NewComment {
            id: CommentId::new(self.ids.next_id()),
            post_id,
            user_id,
            description: description.to_string(),
            parent_comment_id,
            depth,
            path,
            created_at: datetime_from_millis(current_time_millis()),
        };
        self.db.create_comment(&new_comment).await?;

        info!(
            comment_id = %new_comment.id,
            post_id = %post_id,
            depth = new_comment.depth,
            "Comment posted"
        );
        Ok(new_comment.into_comment())
    }

    /// Every comment on an echo as a forest, newest first at each level
    #[instrument(skip(self))]
    pub async fn get_comment_tree(&self, post_id: EchoId) -> AppResult<Vec<CommentNode>> {
        if !self.db.echo_exists(post_id).await? {
            return Err(AppError::NotFound(format!("Echo {} not found", post_id)));
        }
        let rows = self.db.get_comments_for_echo(post_id).await?;
        Ok(build_forest(rows))
    }

    /// One comment with all of its replies
    #[instrument(skip(self))]
    pub async fn get_comment_thread(&self, comment_id: CommentId) -> AppResult<CommentNode> {
        let root = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;
        let rows = self.db.get_comment_subtree(&root).await?;
        build_thread(comment_id, rows).ok_or_else(|| {
            AppError::Internal(format!("Comment {} missing from its own thread", comment_id))
        })
    }
}
