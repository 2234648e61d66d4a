//! Logging middleware
//!
//! Request spans come from `tower_http::trace::TraceLayer`; this middleware
//! adds the response body of every server error to the log.

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_LENGTH;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::error;

const MAX_LOGGED_BODY: usize = 4096;

pub async fn log_errors(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(method = %method, path = %path, status = %parts.status, error = %e, "Server error with unreadable body");
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        method = %method,
        path = %path,
        status = %parts.status,
        body = %String::from_utf8_lossy(&bytes),
        "Server error response"
    );

    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
