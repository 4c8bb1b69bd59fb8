use axum::{
    extract::{Request, State},
    http::{header::ALLOW, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ErrorVerbosityProvider, MethodNotAllowedError};

/// Middleware to replace axum's empty `405` response with an [`ApiError`].
pub async fn method_not_allowed<S: ErrorVerbosityProvider>(
    State(state): State<S>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let res = next.run(req).await;

    if res.status() != StatusCode::METHOD_NOT_ALLOWED {
        return res;
    }

    tracing::warn!(%method, "Method not allowed");

    // Keep the `Allow` header axum computed for the route.
    let allow = res.headers().get(ALLOW).cloned();
    let mut res =
        ApiError::from(MethodNotAllowedError::new(state.error_verbosity())).into_response();

    if let Some(allow) = allow {
        res.headers_mut().insert(ALLOW, allow);
    }

    res
}
