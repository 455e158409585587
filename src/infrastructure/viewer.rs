// Viewer context - who is making the request
// Built once per request by the middleware; services only ever see this.

use crate::core::strong_types::UserId;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    /// None for anonymous callers
    pub user_id: Option<UserId>,
    pub request_id: String,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            user_id: None,
            request_id,
        }
    }

    pub fn authenticated(user_id: UserId, request_id: String) -> Self {
        Self {
            user_id: Some(user_id),
            request_id,
        }
    }

    /// The caller's id, or Unauthenticated for anonymous viewers
    pub fn require_user(&self) -> AppResult<UserId> {
        self.user_id
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))
    }
}
