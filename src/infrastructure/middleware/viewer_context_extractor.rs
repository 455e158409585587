// ViewerContext Extractor - hands the request's viewer to handlers

use crate::{error::AppError, infrastructure::viewer::ViewerContext};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Shared handle to the request's ViewerContext.
///
/// Derefs to `ViewerContext`, so handlers write `vc.require_user()?` or pass
/// `&vc` wherever a `&ViewerContext` is expected. Cloning only bumps the Arc.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// The viewer context middleware must run before any handler using this
impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or_else(|| {
                AppError::Internal("Viewer context middleware is not installed".to_string())
            });

        async move { vc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strong_types::UserId;
    use axum::http::Request;

    #[test]
    fn test_vc_deref() {
        let viewer_context = Arc::new(ViewerContext::authenticated(
            UserId::new(42),
            "test-request".to_string(),
        ));
        let vc = Vc(viewer_context.clone());

        assert_eq!(vc.request_id, "test-request");
        assert_eq!(vc.require_user().unwrap(), UserId::new(42));
        assert!(std::ptr::eq(&*vc, &*viewer_context));
    }

    #[tokio::test]
    async fn test_extract_from_extensions() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts
            .extensions
            .insert(Arc::new(ViewerContext::anonymous("req-x".to_string())));

        let vc = Vc::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(vc.user_id, None);
    }

    #[tokio::test]
    async fn test_missing_context_is_a_server_error() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let rejection = Vc::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(rejection, AppError::Internal(_)));
        assert_eq!(rejection.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
