// Echo domain - the posts comments hang off

pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::strong_types::{EchoId, UserId};

pub use service::EchoService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Echo {
    pub id: EchoId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
