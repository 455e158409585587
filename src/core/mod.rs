// Core types and primitives shared by every domain

pub mod strong_types;
pub mod time;

pub use strong_types::{CommentId, EchoId, FollowId, UserId};
pub use time::{current_time_millis, datetime_from_millis};
