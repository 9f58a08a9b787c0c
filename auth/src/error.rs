//! Error types for authentication and authorization.

use crewbook_web::AppError;
use thiserror::Error;

use crate::claims::UserRole;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Ways a request can fail to authenticate or authorize.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header was sent.
    #[error("Missing authorization header")]
    MissingToken,

    /// The header is not of the form `Bearer <token>`.
    #[error("Invalid authorization format. Expected 'Bearer <token>'")]
    MalformedHeader,

    /// The token has passed its `exp` claim.
    #[error("Token has expired")]
    Expired,

    /// Signature, algorithm or claims did not verify.
    #[error("Invalid token: {reason}")]
    InvalidToken {
        /// Why verification failed
        reason: String,
    },

    /// The caller is authenticated but has the wrong role.
    #[error("This action requires a {required} account")]
    Forbidden {
        /// Role the route demands
        required: UserRole,
    },

    /// A token could not be signed.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidToken {
                reason: err.to_string(),
            },
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden { .. } => Self::forbidden(err.to_string()),
            AuthError::Signing(_) => Self::internal("An internal error occurred"),
            AuthError::MissingToken
            | AuthError::MalformedHeader
            | AuthError::Expired
            | AuthError::InvalidToken { .. } => Self::unauthorized(err.to_string()),
        }
    }
}
