// SocialGraphService - idempotent follow/unfollow and follower listings
//
// Every mutation is a single store transaction in which the follows table's
// unique (follower_id, following_id) constraint decides whether anything
// changed. Repeated or concurrent identical calls therefore leave the counters
// where a single call would.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::{
    FollowListItem, FollowOutcome, FollowStatus, NewFollow, Page, PageRequest, ToggleOutcome,
    UnfollowOutcome,
};
use crate::config::LimitsConfig;
use crate::core::strong_types::{FollowId, UserId};
use crate::core::{current_time_millis, datetime_from_millis};
use crate::domains::user::UserProfile;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{DatabaseInterface, FollowDirection};
use crate::infrastructure::id_generator::IdGenerator;
use crate::infrastructure::viewer::ViewerContext;

#[derive(Clone)]
pub struct SocialGraphService {
    db: Arc<dyn DatabaseInterface>,
    ids: Arc<IdGenerator>,
    limits: LimitsConfig,
}

impl SocialGraphService {
    pub fn new(db: Arc<dyn DatabaseInterface>, ids: Arc<IdGenerator>, limits: LimitsConfig) -> Self {
        Self { db, ids, limits }
    }

    /// Caller starts following `target`. Following twice is a no-op.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn follow(&self, vc: &ViewerContext, target: UserId) -> AppResult<FollowOutcome> {
        let edge = self.new_edge(vc, target)?;
        let created = self.db.insert_follow(&edge).await?;
        if created {
            info!(follower = %edge.follower_id, following = %target, "Follow created");
        } else {
            debug!(follower = %edge.follower_id, following = %target, "Already following");
        }
        Ok(FollowOutcome { created })
    }

    /// Caller stops following `target`. Unfollowing a non-followed user is a no-op.
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn unfollow(&self, vc: &ViewerContext, target: UserId) -> AppResult<UnfollowOutcome> {
        let follower = Self::acting_user(vc, target)?;
        let removed = self.db.delete_follow(follower, target).await?;
        if removed {
            info!(follower = %follower, following = %target, "Follow removed");
        } else {
            debug!(follower = %follower, following = %target, "Not following, nothing to remove");
        }
        Ok(UnfollowOutcome { removed })
    }

    /// Flip the follow state in one transaction
    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn toggle_follow(&self, vc: &ViewerContext, target: UserId) -> AppResult<ToggleOutcome> {
        let edge = self.new_edge(vc, target)?;
        let outcome = self.db.toggle_follow(&edge).await?;
        info!(
            follower = %edge.follower_id,
            following = %target,
            is_following = outcome.is_following,
            changed = outcome.changed,
            "Follow toggled"
        );
        Ok(outcome)
    }

    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn is_following(&self, vc: &ViewerContext, target: UserId) -> AppResult<FollowStatus> {
        let follower = vc.require_user()?;
        let is_following = follower != target && self.db.follow_exists(follower, target).await?;
        Ok(FollowStatus { is_following })
    }

    /// Users following `user`, oldest edge first
    #[instrument(skip(self))]
    pub async fn list_followers(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> AppResult<Page<FollowListItem>> {
        self.list(user, FollowDirection::Followers, request).await
    }

    /// Users `user` follows, oldest edge first
    #[instrument(skip(self))]
    pub async fn list_following(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> AppResult<Page<FollowListItem>> {
        self.list(user, FollowDirection::Following, request).await
    }

    /// Recompute a user's counters from the edges actually stored
    #[instrument(skip(self))]
    pub async fn reconcile_follow_counters(&self, user: UserId) -> AppResult<UserProfile> {
        let before = self
            .db
            .get_user(user)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user)))?;
        if !self.db.reconcile_follow_counters(user).await? {
            return Err(AppError::NotFound(format!("User {} not found", user)));
        }
        let after = self
            .db
            .get_user(user)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user)))?;

        if before.followers_count != after.followers_count
            || before.following_count != after.following_count
        {
            info!(
                user = %user,
                followers_before = before.followers_count,
                followers_after = after.followers_count,
                following_before = before.following_count,
                following_after = after.following_count,
                "Follow counters corrected"
            );
        }
        Ok(after)
    }

    async fn list(
        &self,
        user: UserId,
        direction: FollowDirection,
        request: PageRequest,
    ) -> AppResult<Page<FollowListItem>> {
        if !self.db.user_exists(user).await? {
            return Err(AppError::NotFound(format!("User {} not found", user)));
        }
        let take = self.limits.page_size(request.take);
        let rows = self
            .db
            .list_follows(user, direction, request.cursor, take + 1)
            .await?;
        Ok(Page::from_overfetch(rows, take as usize, |item| item.follow_id))
    }

    fn new_edge(&self, vc: &ViewerContext, target: UserId) -> AppResult<NewFollow> {
        let follower = Self::acting_user(vc, target)?;
        Ok(NewFollow {
            id: FollowId::new(self.ids.next_id()),
            follower_id: follower,
            following_id: target,
            created_at: datetime_from_millis(current_time_millis()),
        })
    }

    fn acting_user(vc: &ViewerContext, target: UserId) -> AppResult<UserId> {
        let follower = vc.require_user()?;
        if follower == target {
            return Err(AppError::InvalidArgument("You cannot follow yourself".to_string()));
        }
        Ok(follower)
    }
}
