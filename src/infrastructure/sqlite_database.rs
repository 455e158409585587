use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Transaction,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::core::strong_types::{CommentId, EchoId, FollowId, UserId};
use crate::domains::comment::{tree::descendant_path_prefix, Comment, CommentWithAuthor, NewComment};
use crate::domains::echo::Echo;
use crate::domains::social_graph::{FollowListItem, NewFollow, ToggleOutcome};
use crate::domains::user::{NewUser, UserProfile};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{
    comment_from_row, comment_select, comment_with_author_from_row, counter_updates,
    follow_item_from_row, follow_list_select, user_profile_from_row, DatabaseInterface,
    FollowDirection,
};

const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        followers_count INTEGER NOT NULL DEFAULT 0 CHECK (followers_count >= 0),
        following_count INTEGER NOT NULL DEFAULT 0 CHECK (following_count >= 0),
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS echoes (
        id INTEGER PRIMARY KEY,
        author_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY,
        post_id INTEGER NOT NULL REFERENCES echoes(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        description TEXT NOT NULL,
        parent_comment_id INTEGER REFERENCES comments(id),
        depth INTEGER NOT NULL CHECK (depth >= 0),
        path TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_post_created ON comments(post_id, created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_path ON comments(post_id, path)",
    r#"
    CREATE TABLE IF NOT EXISTS follows (
        id INTEGER PRIMARY KEY,
        follower_id INTEGER NOT NULL REFERENCES users(id),
        following_id INTEGER NOT NULL REFERENCES users(id),
        created_at INTEGER NOT NULL,
        UNIQUE (follower_id, following_id),
        CHECK (follower_id <> following_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id, id)",
];

/// SQLite implementation of database interface, used for tests and local runs
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Fresh in-memory store with the schema applied.
    ///
    /// Every pooled connection to `sqlite::memory:` would see its own empty
    /// database, so the pool is pinned to one connection that never expires.
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Configuration(format!("Invalid SQLite URL: {}", e)))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.url.contains(":memory:") {
            return Self::new_in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::Configuration(format!("Invalid SQLite URL {}: {}", config.url, e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(config.acquire_timeout_secs));
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to connect to SQLite: {}", e)))?;

        info!(url = %config.url, "Connected to SQLite");
        Ok(Self { pool })
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to begin transaction: {}", e)))
    }

    async fn require_users_tx(tx: &mut Transaction<'_, Sqlite>, ids: [UserId; 2]) -> AppResult<()> {
        for id in ids {
            let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
                .bind(id.value())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::Unavailable(format!("Failed to check user {}: {}", id, e))
                })?;
            if row.is_none() {
                return Err(AppError::NotFound(format!("User {} not found", id)));
            }
        }
        Ok(())
    }

    /// Insert the edge if both users exist and it is not already there.
    ///
    /// No read may precede this in its transaction: a deferred SQLite
    /// transaction that has read cannot upgrade to a write lock while another
    /// connection is writing. The user check is folded into the insert.
    async fn insert_edge_tx(tx: &mut Transaction<'_, Sqlite>, edge: &NewFollow) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (id, follower_id, following_id, created_at)
             SELECT ?1, ?2, ?3, ?4
             WHERE EXISTS (SELECT 1 FROM users WHERE id = ?2)
               AND EXISTS (SELECT 1 FROM users WHERE id = ?3)
             ON CONFLICT (follower_id, following_id) DO NOTHING",
        )
        .bind(edge.id.value())
        .bind(edge.follower_id.value())
        .bind(edge.following_id.value())
        .bind(edge.created_at.timestamp_millis())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to insert follow edge: {}", e)))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_edge_tx(
        tx: &mut Transaction<'_, Sqlite>,
        follower: UserId,
        following: UserId,
    ) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower.value())
            .bind(following.value())
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to delete follow edge: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_counters_tx(
        tx: &mut Transaction<'_, Sqlite>,
        follower: UserId,
        following: UserId,
        delta: i64,
    ) -> AppResult<()> {
        for (id, column) in counter_updates(follower, following) {
            let sql = format!("UPDATE users SET {column} = {column} + ? WHERE id = ?");
            let result = sqlx::query(&sql)
                .bind(delta)
                .bind(id.value())
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::Unavailable(format!("Failed to update {} for user {}: {}", column, id, e))
                })?;
            if result.rows_affected() != 1 {
                return Err(AppError::NotFound(format!("User {} not found", id)));
            }
        }
        Ok(())
    }

    async fn commit(tx: Transaction<'_, Sqlite>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to commit transaction: {}", e)))
    }
}

#[async_trait]
impl DatabaseInterface for SqliteDatabase {
    async fn initialize(&self) -> AppResult<()> {
        for statement in SQLITE_SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Unavailable(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, first_name, last_name, created_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(user.id.value())
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to create user {}: {}", user.username, e)))?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name, followers_count, following_count, created_at FROM users WHERE id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to get user {}: {}", id, e)))?;
        Ok(row.as_ref().map(user_profile_from_row))
    }

    async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to check user {}: {}", id, e)))?;
        Ok(row.is_some())
    }

    async fn create_echo(&self, echo: &Echo) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO echoes (id, author_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(echo.id.value())
        .bind(echo.author_id.value())
        .bind(&echo.title)
        .bind(&echo.content)
        .bind(echo.created_at.timestamp_millis())
        .bind(echo.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to create echo {}: {}", echo.id, e)))?;
        Ok(())
    }

    async fn echo_exists(&self, id: EchoId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM echoes WHERE id = ?")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to check echo {}: {}", id, e)))?;
        Ok(row.is_some())
    }

    async fn create_comment(&self, comment: &NewComment) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, user_id, description, parent_comment_id, depth, path, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.id.value())
        .bind(comment.post_id.value())
        .bind(comment.user_id.value())
        .bind(&comment.description)
        .bind(comment.parent_comment_id.map(CommentId::value))
        .bind(comment.depth as i64)
        .bind(&comment.path)
        .bind(comment.created_at.timestamp_millis())
        .bind(comment.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to create comment {}: {}", comment.id, e)))?;
        Ok(())
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, user_id, description, parent_comment_id, depth, path, created_at, updated_at FROM comments WHERE id = ?",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to get comment {}: {}", id, e)))?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn get_comments_for_echo(&self, post_id: EchoId) -> AppResult<Vec<CommentWithAuthor>> {
        let sql = format!(
            "{} WHERE c.post_id = ? ORDER BY c.created_at DESC, c.id DESC",
            comment_select()
        );
        let rows = sqlx::query(&sql)
            .bind(post_id.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to get comments for echo {}: {}", post_id, e))
            })?;
        rows.iter().map(comment_with_author_from_row).collect()
    }

    async fn get_comment_subtree(&self, root: &Comment) -> AppResult<Vec<CommentWithAuthor>> {
        let prefix = descendant_path_prefix(root);
        let sql = format!(
            "{} WHERE c.post_id = ? AND (c.id = ? OR c.path = ? OR c.path LIKE ?) ORDER BY c.created_at DESC, c.id DESC",
            comment_select()
        );
        let rows = sqlx::query(&sql)
            .bind(root.post_id.value())
            .bind(root.id.value())
            .bind(&prefix)
            .bind(format!("{}.%", prefix))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to get thread for comment {}: {}", root.id, e))
            })?;
        rows.iter().map(comment_with_author_from_row).collect()
    }

    async fn insert_follow(&self, edge: &NewFollow) -> AppResult<bool> {
        let mut tx = self.begin().await?;
        if !Self::insert_edge_tx(&mut tx, edge).await? {
            // Nothing inserted: the edge exists, or one of the users does not
            Self::require_users_tx(&mut tx, [edge.follower_id, edge.following_id]).await?;
            return Ok(false);
        }
        Self::adjust_counters_tx(&mut tx, edge.follower_id, edge.following_id, 1).await?;
        Self::commit(tx).await?;
        Ok(true)
    }

    async fn delete_follow(&self, follower: UserId, following: UserId) -> AppResult<bool> {
        let mut tx = self.begin().await?;
        if !Self::delete_edge_tx(&mut tx, follower, following).await? {
            return Ok(false);
        }
        Self::adjust_counters_tx(&mut tx, follower, following, -1).await?;
        Self::commit(tx).await?;
        Ok(true)
    }

    async fn toggle_follow(&self, edge: &NewFollow) -> AppResult<ToggleOutcome> {
        let mut tx = self.begin().await?;
        if Self::delete_edge_tx(&mut tx, edge.follower_id, edge.following_id).await? {
            Self::adjust_counters_tx(&mut tx, edge.follower_id, edge.following_id, -1).await?;
            Self::commit(tx).await?;
            return Ok(ToggleOutcome {
                is_following: false,
                changed: true,
            });
        }

        let created = Self::insert_edge_tx(&mut tx, edge).await?;
        if created {
            Self::adjust_counters_tx(&mut tx, edge.follower_id, edge.following_id, 1).await?;
        } else {
            Self::require_users_tx(&mut tx, [edge.follower_id, edge.following_id]).await?;
        }
        Self::commit(tx).await?;
        Ok(ToggleOutcome {
            is_following: true,
            changed: created,
        })
    }

    async fn follow_exists(&self, follower: UserId, following: UserId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower.value())
            .bind(following.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to check follow edge: {}", e)))?;
        Ok(row.is_some())
    }

    async fn list_follows(
        &self,
        user: UserId,
        direction: FollowDirection,
        cursor: Option<FollowId>,
        limit: u32,
    ) -> AppResult<Vec<FollowListItem>> {
        let sql = follow_list_select(direction, ["?", "?", "?"]);
        let rows = sqlx::query(&sql)
            .bind(user.value())
            .bind(cursor.map(FollowId::value).unwrap_or(i64::MIN))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to list {:?} of user {}: {}", direction, user, e))
            })?;
        Ok(rows.iter().map(follow_item_from_row).collect())
    }

    async fn reconcile_follow_counters(&self, user: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET
                followers_count = (SELECT COUNT(*) FROM follows WHERE following_id = ?1),
                following_count = (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)
             WHERE id = ?1",
        )
        .bind(user.value())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Unavailable(format!("Failed to reconcile counters for user {}: {}", user, e))
        })?;
        Ok(result.rows_affected() == 1)
    }
}

impl SqliteDatabase {
    /// Overwrite a user's counters without touching edges. Test hook for
    /// simulating drift from out-of-band writes.
    #[doc(hidden)]
    pub async fn force_follow_counters(
        &self,
        user: UserId,
        followers: i64,
        following: i64,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET followers_count = ?, following_count = ? WHERE id = ?")
            .bind(followers)
            .bind(following)
            .bind(user.value())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to overwrite counters: {}", e)))?;
        Ok(())
    }
}
