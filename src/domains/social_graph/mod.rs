// Social graph - follow edges and the counters that mirror them

pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{FollowId, UserId};
use crate::domains::user::UserSummary;

pub use service::SocialGraphService;

/// A directed follow edge about to be written
#[derive(Debug, Clone)]
pub struct NewFollow {
    pub id: FollowId,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowOutcome {
    /// false when the edge already existed
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfollowOutcome {
    /// false when there was no edge to remove
    pub removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    /// State of the edge after the call
    pub is_following: bool,
    /// false when a concurrent caller had already produced that state
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
}

/// One row of a followers/following listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowListItem {
    pub follow_id: FollowId,
    pub user: UserSummary,
    pub followed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub take: Option<u32>,
    /// Id of the first edge of the requested page
    pub cursor: Option<FollowId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<FollowId>,
}

impl<T> Page<T> {
    /// Split a `take + 1` fetch into the page and the cursor of the next one
    pub fn from_overfetch(mut rows: Vec<T>, take: usize, id_of: impl Fn(&T) -> FollowId) -> Self {
        let next_cursor = if rows.len() > take {
            let next = rows.get(take).map(&id_of);
            rows.truncate(take);
            next
        } else {
            None
        };
        Page {
            items: rows,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_overfetch() {
        let page = Page::from_overfetch(vec![1, 2, 3], 2, |n| FollowId::new(*n));
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.next_cursor, Some(FollowId::new(3)));

        let last = Page::from_overfetch(vec![3], 2, |n| FollowId::new(*n));
        assert_eq!(last.items, vec![3]);
        assert_eq!(last.next_cursor, None);
    }

    #[test]
    fn test_exact_page_has_no_cursor() {
        let page = Page::from_overfetch(vec![1, 2], 2, |n| FollowId::new(*n));
        assert_eq!(page.items.len(), 2);
        assert!(page.next_cursor.is_none());
    }
}
