// Database Interface - store operations for users, echoes, comments and follow edges
// Follow edge mutations are single transactions: the unique constraint decides
// whether an edge changed, and counters move only in that branch.

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    ColumnIndex, Decode, Postgres, Row, Transaction, Type,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::core::strong_types::{CommentId, EchoId, FollowId, UserId};
use crate::core::time::datetime_from_millis;
use crate::domains::comment::{Comment, CommentWithAuthor, NewComment};
use crate::domains::echo::Echo;
use crate::domains::social_graph::{FollowListItem, NewFollow, ToggleOutcome};
use crate::domains::user::{NewUser, UserProfile, UserSummary};
use crate::error::{AppError, AppResult};
use crate::infrastructure::sqlite_database::SqliteDatabase;

/// Which end of the follow edge a listing is anchored on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowDirection {
    /// Users following the anchor
    Followers,
    /// Users the anchor follows
    Following,
}

impl FollowDirection {
    /// (column matched against the anchor, column joined to users)
    pub(crate) fn columns(self) -> (&'static str, &'static str) {
        match self {
            FollowDirection::Followers => ("following_id", "follower_id"),
            FollowDirection::Following => ("follower_id", "following_id"),
        }
    }
}

/// Store seam for every domain service
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    /// Create tables and indexes if they are missing
    async fn initialize(&self) -> AppResult<()>;
    async fn health_check(&self) -> AppResult<()>;

    // Users
    /// Returns false when the username is already taken
    async fn create_user(&self, user: &NewUser) -> AppResult<bool>;
    async fn get_user(&self, id: UserId) -> AppResult<Option<UserProfile>>;
    async fn user_exists(&self, id: UserId) -> AppResult<bool>;

    // Echoes
    async fn create_echo(&self, echo: &Echo) -> AppResult<()>;
    async fn echo_exists(&self, id: EchoId) -> AppResult<bool>;

    // Comments
    async fn create_comment(&self, comment: &NewComment) -> AppResult<()>;
    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>>;
    /// Every comment on an echo, newest first
    async fn get_comments_for_echo(&self, post_id: EchoId) -> AppResult<Vec<CommentWithAuthor>>;
    /// `root` and all of its descendants, newest first
    async fn get_comment_subtree(&self, root: &Comment) -> AppResult<Vec<CommentWithAuthor>>;

    // Follow edges
    /// Insert the edge and bump both counters. Returns false, touching
    /// nothing, when the edge already exists.
    async fn insert_follow(&self, edge: &NewFollow) -> AppResult<bool>;
    /// Remove the edge and decrement both counters. Returns false when no
    /// edge existed.
    async fn delete_follow(&self, follower: UserId, following: UserId) -> AppResult<bool>;
    /// Conditional delete, else insert, as one transaction
    async fn toggle_follow(&self, edge: &NewFollow) -> AppResult<ToggleOutcome>;
    async fn follow_exists(&self, follower: UserId, following: UserId) -> AppResult<bool>;
    /// Up to `limit` edges with id >= `cursor`, ascending by edge id
    async fn list_follows(
        &self,
        user: UserId,
        direction: FollowDirection,
        cursor: Option<FollowId>,
        limit: u32,
    ) -> AppResult<Vec<FollowListItem>>;
    /// Recompute both counters from the edge table. Returns false when the
    /// user does not exist.
    async fn reconcile_follow_counters(&self, user: UserId) -> AppResult<bool>;
}

/// Connect to the store named by the configuration and initialize its schema
pub async fn connect_database(config: &DatabaseConfig) -> AppResult<Arc<dyn DatabaseInterface>> {
    let database: Arc<dyn DatabaseInterface> = if config.url.starts_with("sqlite:") {
        Arc::new(SqliteDatabase::connect(config).await?)
    } else {
        Arc::new(PostgresDatabase::connect(config).await?)
    };
    database.initialize().await?;
    Ok(database)
}

// === Row mapping shared by both backends ===

/// Aliases under which a joined user appears in a result row
struct SummaryColumns {
    id: &'static str,
    username: &'static str,
    first_name: &'static str,
    last_name: &'static str,
}

const AUTHOR_COLUMNS: SummaryColumns = SummaryColumns {
    id: "author_id",
    username: "author_username",
    first_name: "author_first_name",
    last_name: "author_last_name",
};

const LISTED_USER_COLUMNS: SummaryColumns = SummaryColumns {
    id: "user_id",
    username: "user_username",
    first_name: "user_first_name",
    last_name: "user_last_name",
};

fn user_summary_from_row<'r, R>(row: &'r R, columns: &SummaryColumns) -> UserSummary
where
    R: Row,
    for<'c> &'c str: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    UserSummary {
        id: UserId::new(row.get(columns.id)),
        username: row.get(columns.username),
        first_name: row.get(columns.first_name),
        last_name: row.get(columns.last_name),
    }
}

pub(crate) fn user_profile_from_row<'r, R>(row: &'r R) -> UserProfile
where
    R: Row,
    for<'c> &'c str: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    UserProfile {
        id: UserId::new(row.get("id")),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        followers_count: row.get("followers_count"),
        following_count: row.get("following_count"),
        created_at: datetime_from_millis(row.get("created_at")),
    }
}

pub(crate) fn comment_from_row<'r, R>(row: &'r R) -> AppResult<Comment>
where
    R: Row,
    for<'c> &'c str: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    let id = CommentId::new(row.get("id"));
    let parent: Option<i64> = row.get("parent_comment_id");
    let depth: i64 = row.get("depth");
    let depth = u32::try_from(depth)
        .map_err(|_| AppError::Internal(format!("Comment {} has invalid depth {}", id, depth)))?;
    Ok(Comment {
        id,
        post_id: EchoId::new(row.get("post_id")),
        user_id: UserId::new(row.get("user_id")),
        description: row.get("description"),
        parent_comment_id: parent.map(CommentId::new),
        depth,
        path: row.get("path"),
        created_at: datetime_from_millis(row.get("created_at")),
        updated_at: datetime_from_millis(row.get("updated_at")),
    })
}

pub(crate) fn comment_with_author_from_row<'r, R>(row: &'r R) -> AppResult<CommentWithAuthor>
where
    R: Row,
    for<'c> &'c str: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    Ok(CommentWithAuthor {
        comment: comment_from_row(row)?,
        author: user_summary_from_row(row, &AUTHOR_COLUMNS),
    })
}

pub(crate) fn follow_item_from_row<'r, R>(row: &'r R) -> FollowListItem
where
    R: Row,
    for<'c> &'c str: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
{
    FollowListItem {
        follow_id: FollowId::new(row.get("follow_id")),
        user: user_summary_from_row(row, &LISTED_USER_COLUMNS),
        followed_at: datetime_from_millis(row.get("followed_at")),
    }
}

/// Counter updates for one edge, ordered by user id so that opposing
/// follows (a->b, b->a) always lock user rows in the same order.
pub(crate) fn counter_updates(follower: UserId, following: UserId) -> [(UserId, &'static str); 2] {
    let mut updates = [(follower, "following_count"), (following, "followers_count")];
    updates.sort_by_key(|(id, _)| *id);
    updates
}

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.user_id, c.description, c.parent_comment_id, c.depth, c.path, c.created_at, c.updated_at, \
     u.id AS author_id, u.username AS author_username, u.first_name AS author_first_name, u.last_name AS author_last_name";

pub(crate) fn comment_select() -> String {
    format!(
        "SELECT {} FROM comments c JOIN users u ON u.id = c.user_id",
        COMMENT_COLUMNS
    )
}

/// Follow listing query; `params` are the backend's placeholders for
/// (anchor user, cursor, limit)
pub(crate) fn follow_list_select(direction: FollowDirection, params: [&str; 3]) -> String {
    let (anchor, other) = direction.columns();
    let [user, cursor, limit] = params;
    format!(
        "SELECT f.id AS follow_id, f.created_at AS followed_at, \
         u.id AS user_id, u.username AS user_username, u.first_name AS user_first_name, u.last_name AS user_last_name \
         FROM follows f JOIN users u ON u.id = f.{other} \
         WHERE f.{anchor} = {user} AND f.id >= {cursor} ORDER BY f.id ASC LIMIT {limit}"
    )
}

/// PostgreSQL implementation of database interface
pub struct PostgresDatabase {
    pool: PgPool,
}

const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        followers_count BIGINT NOT NULL DEFAULT 0 CHECK (followers_count >= 0),
        following_count BIGINT NOT NULL DEFAULT 0 CHECK (following_count >= 0),
        created_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS echoes (
        id BIGINT PRIMARY KEY,
        author_id BIGINT NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id BIGINT PRIMARY KEY,
        post_id BIGINT NOT NULL REFERENCES echoes(id),
        user_id BIGINT NOT NULL REFERENCES users(id),
        description TEXT NOT NULL,
        parent_comment_id BIGINT REFERENCES comments(id),
        depth BIGINT NOT NULL CHECK (depth >= 0),
        path TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_post_created ON comments(post_id, created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_path ON comments(post_id, path text_pattern_ops)",
    r#"
    CREATE TABLE IF NOT EXISTS follows (
        id BIGINT PRIMARY KEY,
        follower_id BIGINT NOT NULL REFERENCES users(id),
        following_id BIGINT NOT NULL REFERENCES users(id),
        created_at BIGINT NOT NULL,
        UNIQUE (follower_id, following_id),
        CHECK (follower_id <> following_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id, id)",
];

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to connect to database: {}", e)))?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            acquire_timeout_secs = config.acquire_timeout_secs,
            "Connected to PostgreSQL"
        );
        Ok(Self::new(pool))
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to begin transaction: {}", e)))
    }

    async fn require_users_tx(
        tx: &mut Transaction<'_, Postgres>,
        ids: [UserId; 2],
    ) -> AppResult<()> {
        for id in ids {
            let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
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

    async fn insert_edge_tx(tx: &mut Transaction<'_, Postgres>, edge: &NewFollow) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (id, follower_id, following_id, created_at) VALUES ($1, $2, $3, $4)
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
        tx: &mut Transaction<'_, Postgres>,
        follower: UserId,
        following: UserId,
    ) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower.value())
            .bind(following.value())
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to delete follow edge: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_counters_tx(
        tx: &mut Transaction<'_, Postgres>,
        follower: UserId,
        following: UserId,
        delta: i64,
    ) -> AppResult<()> {
        for (id, column) in counter_updates(follower, following) {
            let sql = format!("UPDATE users SET {column} = {column} + $1 WHERE id = $2");
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

    async fn commit(tx: Transaction<'_, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to commit transaction: {}", e)))
    }
}

#[async_trait]
impl DatabaseInterface for PostgresDatabase {
    async fn initialize(&self) -> AppResult<()> {
        for statement in POSTGRES_SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Unavailable(format!("Failed to initialize schema: {}", e)))?;
        }
        info!("PostgreSQL schema ready");
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
            "INSERT INTO users (id, username, first_name, last_name, created_at) VALUES ($1, $2, $3, $4, $5)
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
            "SELECT id, username, first_name, last_name, followers_count, following_count, created_at FROM users WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to get user {}: {}", id, e)))?;
        Ok(row.as_ref().map(user_profile_from_row))
    }

    async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to check user {}: {}", id, e)))?;
        Ok(row.is_some())
    }

    async fn create_echo(&self, echo: &Echo) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO echoes (id, author_id, title, content, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
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
        let row = sqlx::query("SELECT 1 FROM echoes WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to check echo {}: {}", id, e)))?;
        Ok(row.is_some())
    }

    async fn create_comment(&self, comment: &NewComment) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, user_id, description, parent_comment_id, depth, path, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
        )
        .bind(comment.id.value())
        .bind(comment.post_id.value())
        .bind(comment.user_id.value())
        .bind(&comment.description)
        .bind(comment.parent_comment_id.map(CommentId::value))
        .bind(comment.depth as i64)
        .bind(&comment.path)
        .bind(comment.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to create comment {}: {}", comment.id, e)))?;
        Ok(())
    }

    async fn get_comment(&self, id: CommentId) -> AppResult<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, user_id, description, parent_comment_id, depth, path, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to get comment {}: {}", id, e)))?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn get_comments_for_echo(&self, post_id: EchoId) -> AppResult<Vec<CommentWithAuthor>> {
        let sql = format!(
            "{} WHERE c.post_id = $1 ORDER BY c.created_at DESC, c.id DESC",
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
        let prefix = crate::domains::comment::tree::descendant_path_prefix(root);
        let sql = format!(
            "{} WHERE c.post_id = $1 AND (c.id = $2 OR c.path = $3 OR c.path LIKE $4) ORDER BY c.created_at DESC, c.id DESC",
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
        Self::require_users_tx(&mut tx, [edge.follower_id, edge.following_id]).await?;
        if !Self::insert_edge_tx(&mut tx, edge).await? {
            // The unique constraint absorbed it; leave the counters alone
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

        Self::require_users_tx(&mut tx, [edge.follower_id, edge.following_id]).await?;
        let created = Self::insert_edge_tx(&mut tx, edge).await?;
        if created {
            Self::adjust_counters_tx(&mut tx, edge.follower_id, edge.following_id, 1).await?;
        }
        Self::commit(tx).await?;
        Ok(ToggleOutcome {
            is_following: true,
            changed: created,
        })
    }

    async fn follow_exists(&self, follower: UserId, following: UserId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2")
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
        let sql = follow_list_select(direction, ["$1", "$2", "$3"]);
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
                followers_count = (SELECT COUNT(*) FROM follows WHERE following_id = $1),
                following_count = (SELECT COUNT(*) FROM follows WHERE follower_id = $1)
             WHERE id = $1",
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
