mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use echoed::echoed_interface::create_echoed_router;
use serde_json::{json, Value};
use tower::ServiceExt;

const IDENTITY: &str = "x-echoed-user-id";

async fn router() -> Router {
    let app = common::setup().await;
    create_echoed_router(app.state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = caller {
        builder = builder.header(IDENTITY, id.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, username: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/users",
        None,
        Some(json!({"username": username, "firstName": "Test", "lastName": "User"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    body["data"]["id"].as_i64().unwrap()
}

async fn followers_count(app: &Router, user: i64) -> i64 {
    let (status, body) = send(app, "GET", &format!("/users/{}", user), None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["followersCount"].as_i64().unwrap()
}

#[tokio::test]
async fn test_follow_round_trip_over_http() {
    let app = router().await;
    let a = create_user(&app, "alice").await;
    let b = create_user(&app, "bob").await;
    let follow = format!("/users/{}/follow", b);

    let (status, body) = send(&app, "POST", &follow, Some(a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["created"], true);
    assert_eq!(followers_count(&app, b).await, 1);

    let (status, body) = send(&app, "POST", &follow, Some(a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["created"], false);
    assert_eq!(followers_count(&app, b).await, 1);

    let (_, body) = send(&app, "GET", &follow, Some(a), None).await;
    assert_eq!(body["data"]["isFollowing"], true);

    let (status, body) = send(&app, "DELETE", &follow, Some(a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], true);
    assert_eq!(followers_count(&app, b).await, 0);

    let (_, body) = send(&app, "POST", &format!("{}/toggle", follow), Some(a), None).await;
    assert_eq!(body["data"]["isFollowing"], true);
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(followers_count(&app, b).await, 1);
}

#[tokio::test]
async fn test_error_envelope() {
    let app = router().await;
    let a = create_user(&app, "alice").await;

    let (status, body) = send(&app, "POST", &format!("/users/{}/follow", a), Some(a), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "You cannot follow yourself");
    assert!(body["data"].is_null());

    let (status, body) = send(&app, "POST", &format!("/users/{}/follow", a), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/users/12345", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        "/users",
        None,
        Some(json!({"username": "alice", "firstName": "Again", "lastName": "User"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_identity_header() {
    let app = router().await;
    let request = Request::builder()
        .method("GET")
        .uri("/users/1/follow")
        .header(IDENTITY, "someone")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Malformed x-echoed-user-id header");
    assert!(body["data"].is_null());
}

fn assert_envelope(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_undecodable_requests_use_the_envelope() {
    let app = router().await;
    let a = create_user(&app, "alice").await;

    let (status, body) = send(&app, "GET", "/users/abc", None, None).await;
    assert_envelope(status, &body);

    let (status, body) = send(&app, "GET", &format!("/users/{}/followers?take=x", a), None, None).await;
    assert_envelope(status, &body);

    let (status, body) = send(&app, "POST", "/users", None, Some(json!({"username": "bob"}))).await;
    assert_envelope(status, &body);

    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_envelope(status, &serde_json::from_slice(&bytes).unwrap());

    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .body(Body::from(r#"{"username": "bob", "firstName": "B", "lastName": "B"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_envelope(status, &body);
    assert_eq!(body["message"], "Expected a JSON request body");
}

#[tokio::test]
async fn test_health_check() {
    let app = router().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_comment_tree_over_http() {
    let app = router().await;
    let u1 = create_user(&app, "user_one").await;
    let u2 = create_user(&app, "user_two").await;

    let (status, body) = send(
        &app,
        "POST",
        "/echoes",
        Some(u1),
        Some(json!({"title": "Hello", "content": "First echo"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let echo = body["data"]["id"].as_i64().unwrap();
    let comments = format!("/echoes/{}/comments", echo);

    let (status, body) = send(&app, "POST", &comments, Some(u1), Some(json!({"description": "root"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let c1 = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["depth"], 0);

    let (_, body) = send(
        &app,
        "POST",
        &comments,
        Some(u2),
        Some(json!({"description": "reply", "parentCommentId": c1})),
    )
    .await;
    let c2 = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["path"], format!("{}.{}", echo, c1));

    let (status, body) = send(&app, "GET", &comments, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let forest = body["data"].as_array().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0]["id"].as_i64().unwrap(), c1);
    assert_eq!(forest[0]["author"]["username"], "user_one");
    assert_eq!(forest[0]["orphaned"], false);
    assert_eq!(forest[0]["replies"][0]["id"].as_i64().unwrap(), c2);
    assert_eq!(forest[0]["replies"][0]["parentCommentId"].as_i64().unwrap(), c1);

    let (status, body) = send(&app, "GET", &format!("/comments/{}/thread", c2), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_i64().unwrap(), c2);
    assert!(body["data"]["replies"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, "POST", &comments, Some(u1), Some(json!({"description": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_followers_listing_over_http() {
    let app = router().await;
    let target = create_user(&app, "target").await;
    for name in ["fan_a", "fan_b", "fan_c"] {
        let fan = create_user(&app, name).await;
        send(&app, "POST", &format!("/users/{}/follow", target), Some(fan), None).await;
    }

    let (status, body) = send(&app, "GET", &format!("/users/{}/followers?take=2", target), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["items"][0]["user"]["username"], "fan_a");
    let cursor = body["data"]["nextCursor"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "GET",
        &format!("/users/{}/followers?take=2&cursor={}", target, cursor),
        None,
        None,
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user"]["username"], "fan_c");
    assert!(body["data"]["nextCursor"].is_null());
}
