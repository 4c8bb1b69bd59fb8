use axum::{extract::Request, middleware::Next, response::Response};

/// Middlware to trace incoming and outgoing headers.
pub async fn trace_headers(req: Request, next: Next) -> Response {
    tracing::trace!(method = %req.method(), uri = %req.uri(), headers = ?req.headers(), "Incoming");

    let response = next.run(req).await;

    tracing::trace!(status = %response.status(), headers = ?response.headers(), "Outgoing");

    response
}
