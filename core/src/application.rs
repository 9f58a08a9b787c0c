//! Worker applications to open bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::booking::Booking;
use crate::error::{MarketplaceError, Result};
use crate::identity::{CustomerProfile, WorkerProfile};
use crate::types::{ApplicationId, BookingId, WorkerId};

/// Status of an application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Waiting on the customer.
    Pending,
    /// The customer chose this worker.
    Accepted,
    /// Turned down, explicitly or by the sweep after a sibling was accepted.
    Rejected,
}

impl ApplicationStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(MarketplaceError::Validation(format!(
                "unknown application status: {other}"
            ))),
        }
    }
}

/// A worker's bid on an open booking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingApplication {
    /// Application id.
    pub id: ApplicationId,
    /// Booking applied to.
    pub booking_id: BookingId,
    /// Applying worker.
    pub worker_id: WorkerId,
    /// Pitch to the customer.
    pub message: String,
    /// Price the worker asks for.
    pub proposed_price: f64,
    /// Current status.
    pub status: ApplicationStatus,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Worker-supplied fields for a new application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    /// Booking to apply to.
    pub booking_id: BookingId,
    /// Pitch to the customer.
    #[serde(default)]
    pub message: String,
    /// Price the worker asks for.
    #[serde(default)]
    pub proposed_price: f64,
}

impl ApplicationDraft {
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Validation`] when the price is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.proposed_price.is_finite() || self.proposed_price < 0.0 {
            return Err(MarketplaceError::Validation(
                "proposed price must be a non-negative amount".into(),
            ));
        }
        Ok(())
    }

    /// Materialize a pending application from `worker_id`.
    #[must_use]
    pub fn into_application(self, worker_id: WorkerId, now: DateTime<Utc>) -> BookingApplication {
        BookingApplication {
            id: ApplicationId::new(),
            booking_id: self.booking_id,
            worker_id,
            message: self.message,
            proposed_price: self.proposed_price,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Application as shown to the customer reviewing bids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithWorker {
    /// The application itself.
    #[serde(flatten)]
    pub application: BookingApplication,
    /// Who applied. `None` if the worker record has disappeared.
    pub worker: Option<WorkerProfile>,
}

/// Booking with the customer who posted it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithCustomer {
    /// The booking itself.
    #[serde(flatten)]
    pub booking: Booking,
    /// Who posted it.
    pub customer: Option<CustomerProfile>,
}

/// Application as shown to the worker tracking their bids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithBooking {
    /// The application itself.
    #[serde(flatten)]
    pub application: BookingApplication,
    /// What was applied to.
    pub booking: Option<BookingWithCustomer>,
}
