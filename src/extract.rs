// Local versions of axum's Json, Path and Query extractors.
// A request that fails to decode is answered with the AppError envelope
// instead of axum's plain-text rejection.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

/// JSON body extractor and response type
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Json(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) =
            axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(Path(value))
    }
}

#[derive(Debug)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Query(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[tokio::test]
    async fn test_json_syntax_error_is_invalid_argument() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let err = Json::<Named>::from_request(request, &()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let request = Request::builder()
            .method("POST")
            .body(Body::from("{\"name\": \"x\"}"))
            .unwrap();
        match Json::<Named>::from_request(request, &()).await {
            Err(AppError::InvalidArgument(msg)) => assert_eq!(msg, "Expected a JSON request body"),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let request = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": \"echo\"}"))
            .unwrap();
        let Json(body) = Json::<Named>::from_request(request, &()).await.unwrap();
        assert_eq!(body.name, "echo");
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        take: Option<u32>,
    }

    #[tokio::test]
    async fn test_bad_query_is_invalid_argument() {
        let (mut parts, _) = Request::builder()
            .uri("/users/1/followers?take=lots")
            .body(())
            .unwrap()
            .into_parts();
        let err = Query::<Paging>::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let (mut parts, _) = Request::builder()
            .uri("/users/1/followers?take=5")
            .body(())
            .unwrap()
            .into_parts();
        let Query(paging) = Query::<Paging>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(paging.take, Some(5));
    }
}
