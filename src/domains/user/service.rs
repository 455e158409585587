// UserService - registration and profile lookups

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument};

use super::{NewUser, UserProfile};
use crate::core::strong_types::UserId;
use crate::core::{current_time_millis, datetime_from_millis};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::id_generator::IdGenerator;

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_]{3,32}$").unwrap_or_else(|e| panic!("invalid username pattern: {}", e))
});

const MAX_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct UserService {
    db: Arc<dyn DatabaseInterface>,
    ids: Arc<IdGenerator>,
}

impl UserService {
    pub fn new(db: Arc<dyn DatabaseInterface>, ids: Arc<IdGenerator>) -> Self {
        Self { db, ids }
    }

    #[instrument(skip(self))]
    pub async fn create_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<UserProfile> {
        let username = username.trim();
        if !USERNAME_PATTERN.is_match(username) {
            return Err(AppError::InvalidArgument(
                "Username must be 3-32 characters of a-z, 0-9 or _".to_string(),
            ));
        }
        let first_name = validate_name("First name", first_name)?;
        let last_name = validate_name("Last name", last_name)?;

        let user = NewUser {
            id: UserId::new(self.ids.next_id()),
            username: username.to_string(),
            first_name,
            last_name,
            created_at: datetime_from_millis(current_time_millis()),
        };
        if !self.db.create_user(&user).await? {
            return Err(AppError::Conflict(format!("Username {} is already taken", username)));
        }

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user.into_profile())
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: UserId) -> AppResult<UserProfile> {
        self.db
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

fn validate_name(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidArgument(format!("{} must not be empty", field)));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "{} exceeds {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_pattern() {
        assert!(USERNAME_PATTERN.is_match("ada_99"));
        assert!(!USERNAME_PATTERN.is_match("ab"));
        assert!(!USERNAME_PATTERN.is_match("Ada"));
        assert!(!USERNAME_PATTERN.is_match("has space"));
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("First name", "  Ada ").unwrap(), "Ada");
        assert!(matches!(
            validate_name("First name", "   "),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
