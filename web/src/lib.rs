//! Axum integration for Crewbook.
//!
//! # Request Flow
//!
//! 1. **Correlate**: [`middleware::correlation_id`] tags the request span
//! 2. **Authenticate**: extractors from `crewbook-auth` verify the bearer token
//! 3. **Extract** path, query and JSON body
//! 4. **Call** the booking or application engine
//! 5. **Map** the result: domain values to JSON, [`MarketplaceError`] to [`AppError`]
//!
//! [`MarketplaceError`]: crewbook_core::MarketplaceError

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CorrelationId, JsonBody, PathParam};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
