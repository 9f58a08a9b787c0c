//! Error taxonomy for the booking and application engines.
//!
//! Every precondition failure is a distinct [`MarketplaceError`] variant so
//! the HTTP layer can map each one to the right status code. Storage
//! failures are wrapped in [`StoreError`] and kept apart from domain errors.

use thiserror::Error;

use crate::application::ApplicationStatus;
use crate::booking::{BookingAction, BookingStatus};

/// Errors that can occur in a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing database failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A row could not be mapped back into a domain value.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Which kind of profile a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRole {
    /// Customer record.
    Customer,
    /// Worker record.
    Worker,
}

impl std::fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => f.write_str("customer"),
            Self::Worker => f.write_str("worker"),
        }
    }
}

/// Errors returned by the booking lifecycle and application resolution engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketplaceError {
    /// A referenced booking or application does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Kind of entity ("booking", "application").
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The booking's current status does not allow the requested action.
    #[error("cannot {action} a booking that is {from}")]
    InvalidTransition {
        /// Requested action.
        action: BookingAction,
        /// Status the booking was in.
        from: BookingStatus,
    },

    /// The application's current status does not allow the requested change.
    #[error("only pending applications can be {attempted}")]
    InvalidState {
        /// Status the application was in.
        status: ApplicationStatus,
        /// Status that was requested.
        attempted: ApplicationStatus,
    },

    /// The booking is not open for applications.
    #[error("this booking is not accepting applications")]
    NotAcceptingApplications,

    /// The booking already has an assigned worker.
    #[error("this booking already has an assigned worker")]
    AlreadyAssigned,

    /// The worker has already applied to the booking.
    #[error("you have already applied to this booking")]
    DuplicateApplication,

    /// A guarded claim lost the race for the booking.
    #[error("booking has already been claimed by another worker")]
    AlreadyClaimed,

    /// The authenticated user has no record for the required role.
    #[error("{role} profile not found")]
    ProfileNotFound {
        /// Role that was required.
        role: ProfileRole,
        /// Authenticated user id.
        user_id: String,
    },

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MarketplaceError {
    /// Shorthand for a missing booking.
    #[must_use]
    pub fn booking_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: "booking",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing application.
    #[must_use]
    pub fn application_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: "application",
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::NotAcceptingApplications => "NOT_ACCEPTING_APPLICATIONS",
            Self::AlreadyAssigned => "ALREADY_ASSIGNED",
            Self::DuplicateApplication => "DUPLICATE_APPLICATION",
            Self::AlreadyClaimed => "ALREADY_CLAIMED",
            Self::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Check if this error is caused by the caller (vs. an infrastructure failure).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_client_friendly() {
        assert_eq!(
            MarketplaceError::booking_not_found("x").to_string(),
            "booking not found"
        );
        assert_eq!(
            MarketplaceError::InvalidTransition {
                action: BookingAction::Complete,
                from: BookingStatus::Declined,
            }
            .to_string(),
            "cannot complete a booking that is declined"
        );
        assert_eq!(
            MarketplaceError::InvalidState {
                status: ApplicationStatus::Accepted,
                attempted: ApplicationStatus::Rejected,
            }
            .to_string(),
            "only pending applications can be rejected"
        );
    }

    #[test]
    fn store_errors_are_not_user_errors() {
        let err = MarketplaceError::from(StoreError::DatabaseError("boom".into()));
        assert!(!err.is_user_error());
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
        assert!(MarketplaceError::AlreadyClaimed.is_user_error());
    }
}
