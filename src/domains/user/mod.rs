// User domain - registration and public profiles

pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::UserId;

pub use service::UserService;

/// Author/follower fields shown next to comments and in follow lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Full profile, including the denormalized follow counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            followers_count: 0,
            following_count: 0,
            created_at: self.created_at,
        }
    }
}
