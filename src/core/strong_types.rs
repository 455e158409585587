// Strong Types - newtype ids so users, echoes, comments and follow edges never mix

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw ID value
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identity of a registered user
    UserId
);
define_id!(
    /// Identity of an echo (a post comments attach to)
    EchoId
);
define_id!(
    /// Identity of a single comment
    CommentId
);
define_id!(
    /// Identity of a follow edge; doubles as the pagination cursor
    FollowId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversion() {
        let id = CommentId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
        assert_eq!(UserId::from(7).value(), 7);
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&EchoId::new(99)).unwrap();
        assert_eq!(json, "99");
        let parsed: FollowId = serde_json::from_str("123").unwrap();
        assert_eq!(parsed, FollowId::new(123));
    }
}
