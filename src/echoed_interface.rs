// Echoed HTTP Interface - JSON routes over the domain services
// Every response uses the same envelope: {success, message, data}.

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    app_state::AppState,
    core::strong_types::{CommentId, EchoId, UserId},
    domains::{
        comment::{Comment, CommentNode},
        echo::Echo,
        social_graph::{
            FollowListItem, FollowOutcome, FollowStatus, Page, PageRequest, ToggleOutcome,
            UnfollowOutcome,
        },
        user::UserProfile,
    },
    error::AppResult,
    extract::{Json, Path, Query},
    infrastructure::middleware::{viewer_context_middleware, Vc},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;
type CreatedResult<T> = AppResult<(StatusCode, Json<ApiResponse<T>>)>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEchoRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentRequest {
    pub description: String,
    pub parent_comment_id: Option<CommentId>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

// HTTP Handlers

pub async fn health_handler(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    state.database.health_check().await?;
    Ok(Json(ApiResponse::ok("Healthy", HealthStatus { status: "ok" })))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> CreatedResult<UserProfile> {
    let user = state
        .users
        .create_user(&req.username, &req.first_name, &req.last_name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("User created", user))))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> ApiResult<UserProfile> {
    let user = state.users.get_profile(id).await?;
    Ok(Json(ApiResponse::ok("User found", user)))
}

pub async fn follow_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(target): Path<UserId>,
) -> ApiResult<FollowOutcome> {
    let outcome = state.social_graph.follow(&vc, target).await?;
    let message = if outcome.created {
        "Followed user"
    } else {
        "Already following user"
    };
    Ok(Json(ApiResponse::ok(message, outcome)))
}

pub async fn unfollow_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(target): Path<UserId>,
) -> ApiResult<UnfollowOutcome> {
    let outcome = state.social_graph.unfollow(&vc, target).await?;
    let message = if outcome.removed {
        "Unfollowed user"
    } else {
        "Not following user"
    };
    Ok(Json(ApiResponse::ok(message, outcome)))
}

pub async fn toggle_follow_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(target): Path<UserId>,
) -> ApiResult<ToggleOutcome> {
    let outcome = state.social_graph.toggle_follow(&vc, target).await?;
    let message = if outcome.is_following {
        "Following user"
    } else {
        "Not following user"
    };
    Ok(Json(ApiResponse::ok(message, outcome)))
}

pub async fn is_following_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(target): Path<UserId>,
) -> ApiResult<FollowStatus> {
    let status = state.social_graph.is_following(&vc, target).await?;
    Ok(Json(ApiResponse::ok("Follow status", status)))
}

pub async fn list_followers_handler(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Page<FollowListItem>> {
    let page = state.social_graph.list_followers(user, page).await?;
    Ok(Json(ApiResponse::ok("Followers", page)))
}

pub async fn list_following_handler(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Page<FollowListItem>> {
    let page = state.social_graph.list_following(user, page).await?;
    Ok(Json(ApiResponse::ok("Following", page)))
}

pub async fn reconcile_counters_handler(
    State(state): State<AppState>,
    Path(user): Path<UserId>,
) -> ApiResult<UserProfile> {
    let profile = state.social_graph.reconcile_follow_counters(user).await?;
    Ok(Json(ApiResponse::ok("Follow counters reconciled", profile)))
}

pub async fn create_echo_handler(
    State(state): State<AppState>,
    vc: Vc,
    Json(req): Json<CreateEchoRequest>,
) -> CreatedResult<Echo> {
    let echo = state.echoes.create_echo(&vc, &req.title, &req.content).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Echo created", echo))))
}

pub async fn post_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<EchoId>,
    Json(req): Json<PostCommentRequest>,
) -> CreatedResult<Comment> {
    let comment = state
        .comments
        .post_comment(&vc, post_id, &req.description, req.parent_comment_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Comment posted", comment))))
}

pub async fn get_comment_tree_handler(
    State(state): State<AppState>,
    Path(post_id): Path<EchoId>,
) -> ApiResult<Vec<CommentNode>> {
    let forest = state.comments.get_comment_tree(post_id).await?;
    Ok(Json(ApiResponse::ok("Comments", forest)))
}

pub async fn get_comment_thread_handler(
    State(state): State<AppState>,
    Path(comment_id): Path<CommentId>,
) -> ApiResult<CommentNode> {
    let thread = state.comments.get_comment_thread(comment_id).await?;
    Ok(Json(ApiResponse::ok("Comment thread", thread)))
}

// Create the API router; the viewer context middleware wraps every route
pub fn create_echoed_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))

        // Users
        .route("/users", post(create_user_handler))
        .route("/users/{id}", get(get_user_handler))
        .route(
            "/users/{id}/counters/reconcile",
            post(reconcile_counters_handler),
        )

        // Social graph
        .route(
            "/users/{id}/follow",
            get(is_following_handler)
                .post(follow_handler)
                .delete(unfollow_handler),
        )
        .route("/users/{id}/follow/toggle", post(toggle_follow_handler))
        .route("/users/{id}/followers", get(list_followers_handler))
        .route("/users/{id}/following", get(list_following_handler))

        // Echoes and comments
        .route("/echoes", post(create_echo_handler))
        .route(
            "/echoes/{id}/comments",
            get(get_comment_tree_handler).post(post_comment_handler),
        )
        .route("/comments/{id}/thread", get(get_comment_thread_handler))

        .layer(from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .with_state(state)
}
