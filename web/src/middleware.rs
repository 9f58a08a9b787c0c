//! Request correlation.
//!
//! [`correlation_id`] runs every request inside an `http_request` span
//! tagged with a correlation id. The id comes from the `X-Correlation-ID`
//! header when it is a valid UUID and is generated otherwise; it is stored
//! in the request extensions for [`CorrelationId`] and echoed back on the
//! response.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/v1/bookings/open", get(open_bookings))
//!     .layer(axum::middleware::from_fn(correlation_id));
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::extractors::CorrelationId;

/// Header name for correlation ID (lowercase, as `HeaderName` requires).
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Correlation id carried by `headers`, if present and well-formed.
pub(crate) fn from_headers(headers: &HeaderMap) -> Option<CorrelationId> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(CorrelationId)
}

/// Middleware function; install with `axum::middleware::from_fn(correlation_id)`.
pub async fn correlation_id(mut req: Request, next: Next) -> Response {
    let id = from_headers(req.headers()).unwrap_or_else(|| CorrelationId(Uuid::new_v4()));
    req.extensions_mut().insert(id);

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %id.0,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id.0.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
