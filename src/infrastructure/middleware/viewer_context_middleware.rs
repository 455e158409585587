// ViewerContext Middleware - builds the per-request viewer from the identity header
// and injects it into request extensions

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::core::strong_types::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::viewer::ViewerContext;

/// Application state that knows which header carries the caller's identity
pub trait HasIdentityHeader {
    fn identity_header(&self) -> &str;
}

/// Creates a request-scoped ViewerContext. Requests without the identity
/// header proceed as anonymous; a malformed header is rejected with
/// `InvalidArgument`, rendered as the usual error envelope.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    T: HasIdentityHeader + Clone + Send + Sync + 'static,
{
    let user_id = extract_user_id(request.headers(), app_state.identity_header())?;
    let viewer_context = create_viewer_context(user_id);

    request.extensions_mut().insert(viewer_context);
    Ok(next.run(request).await)
}

/// Read the caller's user id from `header`, if present
fn extract_user_id(headers: &HeaderMap, header: &str) -> AppResult<Option<UserId>> {
    let Some(value) = headers.get(header) else {
        return Ok(None);
    };
    let malformed = || AppError::InvalidArgument(format!("Malformed {} header", header));
    let raw = value.to_str().map_err(|_| malformed())?;
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(Some(UserId::new(id))),
        _ => {
            warn!(header = header, value = raw, "Rejecting malformed identity header");
            Err(malformed())
        }
    }
}

fn create_viewer_context(user_id: Option<UserId>) -> Arc<ViewerContext> {
    let request_id = format!("req-{}", Uuid::new_v4());
    let viewer_context = match user_id {
        Some(user_id) => ViewerContext::authenticated(user_id, request_id),
        None => ViewerContext::anonymous(request_id),
    };
    Arc::new(viewer_context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const HEADER: &str = "x-echoed-user-id";

    #[test]
    fn test_extract_authenticated_user() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, HeaderValue::from_static("1001"));

        let user_id = extract_user_id(&headers, HEADER).unwrap();
        assert_eq!(user_id, Some(UserId::new(1001)));
    }

    #[test]
    fn test_extract_anonymous() {
        let headers = HeaderMap::new();
        assert_eq!(extract_user_id(&headers, HEADER).unwrap(), None);
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, HeaderValue::from_static("not-a-number"));
        match extract_user_id(&headers, HEADER) {
            Err(AppError::InvalidArgument(msg)) => {
                assert_eq!(msg, "Malformed x-echoed-user-id header")
            }
            other => panic!("expected InvalidArgument, got {:?}", other),
        }

        headers.insert(HEADER, HeaderValue::from_static("-4"));
        assert!(matches!(
            extract_user_id(&headers, HEADER),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = create_viewer_context(None);
        let b = create_viewer_context(Some(UserId::new(3)));
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.user_id, None);
        assert_eq!(b.user_id, Some(UserId::new(3)));
    }
}
