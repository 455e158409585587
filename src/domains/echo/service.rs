use std::sync::Arc;

use tracing::{info, instrument};

use super::Echo;
use crate::core::strong_types::EchoId;
use crate::core::{current_time_millis, datetime_from_millis};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::id_generator::IdGenerator;
use crate::infrastructure::viewer::ViewerContext;

#[derive(Clone)]
pub struct EchoService {
    db: Arc<dyn DatabaseInterface>,
    ids: Arc<IdGenerator>,
}

impl EchoService {
    pub fn new(db: Arc<dyn DatabaseInterface>, ids: Arc<IdGenerator>) -> Self {
        Self { db, ids }
    }

    #[instrument(skip(self, vc, content), fields(request_id = %vc.request_id))]
    pub async fn create_echo(&self, vc: &ViewerContext, title: &str, content: &str) -> AppResult<Echo> {
        let author_id = vc.require_user()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidArgument("Echo title must not be empty".to_string()));
        }
        if !self.db.user_exists(author_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", author_id)));
        }

        let now = datetime_from_millis(current_time_millis());
        let echo = Echo {
            id: EchoId::new(self.ids.next_id()),
            author_id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.create_echo(&echo).await?;

        info!(echo_id = %echo.id, author_id = %author_id, "Echo created");
        Ok(echo)
    }
}
