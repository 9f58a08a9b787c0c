//! Booking model and its status machine.
//!
//! ```text
//!             accept             complete
//!   pending ─────────▶ accepted ──────────▶ completed
//!      │ │                 │
//!      │ └─ decline ─▶ declined
//!      │                   │
//!      └───── cancel ──────┴──────▶ cancelled
//! ```
//!
//! `is_open` is orthogonal to the status and only meaningful while the
//! booking is `pending` with no worker assigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarketplaceError, Result};
use crate::types::{BookingId, CustomerId, WorkerId};

/// Status of a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created, waiting for a worker to act.
    Pending,
    /// A worker agreed to do the job.
    Accepted,
    /// The worker turned the job down.
    Declined,
    /// The job is done.
    Completed,
    /// Called off before completion.
    Cancelled,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::Declined,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Status reached by applying `action`, or `None` if the move is illegal.
    #[must_use]
    pub const fn next(self, action: BookingAction) -> Option<Self> {
        match (self, action) {
            (Self::Pending, BookingAction::Accept) => Some(Self::Accepted),
            (Self::Pending, BookingAction::Decline) => Some(Self::Declined),
            (Self::Accepted, BookingAction::Complete) => Some(Self::Completed),
            (Self::Pending | Self::Accepted, BookingAction::Cancel) => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// No checked action leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| MarketplaceError::Validation(format!("unknown booking status: {s}")))
    }
}

/// A checked lifecycle action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BookingAction {
    /// Worker accepts a pending booking.
    Accept,
    /// Worker declines a pending booking.
    Decline,
    /// Worker marks an accepted booking done.
    Complete,
    /// Either party calls the booking off.
    Cancel,
}

impl BookingAction {
    /// Status this action moves a booking into.
    #[must_use]
    pub const fn target(self) -> BookingStatus {
        match self {
            Self::Accept => BookingStatus::Accepted,
            Self::Decline => BookingStatus::Declined,
            Self::Complete => BookingStatus::Completed,
            Self::Cancel => BookingStatus::Cancelled,
        }
    }

    /// Status the action must start from. `Cancel` also accepts `Accepted`.
    #[must_use]
    pub const fn sources(self) -> &'static [BookingStatus] {
        match self {
            Self::Accept | Self::Decline => &[BookingStatus::Pending],
            Self::Complete => &[BookingStatus::Accepted],
            Self::Cancel => &[BookingStatus::Pending, BookingStatus::Accepted],
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        })
    }
}

/// A job posted by a customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking id.
    pub id: BookingId,
    /// Owning customer. Never changes.
    pub customer_id: CustomerId,
    /// Assigned worker, if any.
    pub worker_id: Option<WorkerId>,
    /// Broadcast to every worker.
    pub is_open: bool,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// When the job takes place.
    pub scheduled_date: DateTime<Utc>,
    /// Expected duration in hours.
    pub duration_hours: i32,
    /// Where the job takes place.
    pub location: String,
    /// Customer notes.
    pub notes: String,
    /// Agreed cost.
    pub total_cost: f64,
    /// Current status.
    pub status: BookingStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Open, unassigned and still pending.
    #[must_use]
    pub fn is_claimable(&self) -> bool {
        self.is_open && self.worker_id.is_none() && self.status == BookingStatus::Pending
    }
}

/// Customer-supplied fields for a new booking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    /// Directly targeted worker.
    #[serde(default)]
    pub worker_id: Option<WorkerId>,
    /// Broadcast to every worker instead of a direct target.
    #[serde(default)]
    pub is_open: bool,
    /// Short title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// When the job takes place.
    pub scheduled_date: DateTime<Utc>,
    /// Expected duration in hours.
    #[serde(default)]
    pub duration_hours: i32,
    /// Where the job takes place.
    pub location: String,
    /// Customer notes.
    #[serde(default)]
    pub notes: String,
    /// Offered cost.
    #[serde(default)]
    pub total_cost: f64,
}

impl BookingDraft {
    /// Check the draft against the booking invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Validation`] describing the first problem found.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MarketplaceError::Validation("title is required".into()));
        }
        if self.location.trim().is_empty() {
            return Err(MarketplaceError::Validation("location is required".into()));
        }
        if self.scheduled_date < now {
            return Err(MarketplaceError::Validation(
                "cannot book dates in the past".into(),
            ));
        }
        if self.duration_hours < 0 {
            return Err(MarketplaceError::Validation(
                "duration cannot be negative".into(),
            ));
        }
        if !self.total_cost.is_finite() || self.total_cost < 0.0 {
            return Err(MarketplaceError::Validation(
                "total cost must be a non-negative amount".into(),
            ));
        }
        if self.is_open && self.worker_id.is_some() {
            return Err(MarketplaceError::Validation(
                "an open booking cannot have an assigned worker".into(),
            ));
        }
        Ok(())
    }

    /// Materialize a pending booking owned by `customer_id`.
    #[must_use]
    pub fn into_booking(self, customer_id: CustomerId, now: DateTime<Utc>) -> Booking {
        Booking {
            id: BookingId::new(),
            customer_id,
            worker_id: self.worker_id,
            is_open: self.is_open,
            title: self.title.trim().to_string(),
            description: self.description,
            scheduled_date: self.scheduled_date,
            duration_hours: self.duration_hours,
            location: self.location.trim().to_string(),
            notes: self.notes,
            total_cost: self.total_cost,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn draft(now: DateTime<Utc>) -> BookingDraft {
        BookingDraft {
            worker_id: None,
            is_open: true,
            title: "Fix the fence".into(),
            description: String::new(),
            scheduled_date: now + Duration::days(2),
            duration_hours: 4,
            location: "12 Elm St".into(),
            notes: String::new(),
            total_cost: 150.0,
        }
    }

    fn any_status() -> impl Strategy<Value = BookingStatus> {
        prop::sample::select(BookingStatus::ALL.to_vec())
    }

    fn any_action() -> impl Strategy<Value = BookingAction> {
        prop::sample::select(vec![
            BookingAction::Accept,
            BookingAction::Decline,
            BookingAction::Complete,
            BookingAction::Cancel,
        ])
    }

    proptest! {
        #[test]
        fn transition_table_agrees_with_action_sources(status in any_status(), action in any_action()) {
            let legal = action.sources().contains(&status);
            prop_assert_eq!(status.next(action).is_some(), legal);
            if let Some(next) = status.next(action) {
                prop_assert_eq!(next, action.target());
            }
        }

        #[test]
        fn terminal_statuses_have_no_exit(status in any_status(), action in any_action()) {
            if status.is_terminal() {
                prop_assert!(status.next(action).is_none());
            }
        }
    }

    #[test]
    fn complete_only_from_accepted() {
        assert_eq!(
            BookingStatus::Accepted.next(BookingAction::Complete),
            Some(BookingStatus::Completed)
        );
        assert_eq!(BookingStatus::Pending.next(BookingAction::Complete), None);
        assert_eq!(BookingStatus::Declined.next(BookingAction::Complete), None);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn draft_rejects_past_dates() {
        let now = Utc::now();
        let mut d = draft(now);
        d.scheduled_date = now - Duration::hours(1);
        assert_eq!(
            d.validate(now),
            Err(MarketplaceError::Validation("cannot book dates in the past".into()))
        );
    }

    #[test]
    fn draft_rejects_open_booking_with_worker() {
        let now = Utc::now();
        let mut d = draft(now);
        d.worker_id = Some(WorkerId::new());
        assert!(matches!(d.validate(now), Err(MarketplaceError::Validation(_))));
    }

    #[test]
    fn draft_rejects_blank_title_and_bad_cost() {
        let now = Utc::now();
        let mut d = draft(now);
        d.title = "   ".into();
        assert!(d.validate(now).is_err());

        let mut d = draft(now);
        d.total_cost = f64::NAN;
        assert!(d.validate(now).is_err());
    }

    #[test]
    fn new_bookings_start_pending() {
        let now = Utc::now();
        let customer = CustomerId::new();
        let booking = draft(now).into_booking(customer, now);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.customer_id, customer);
        assert!(booking.is_claimable());
    }

    #[test]
    fn booking_serializes_camel_case() {
        let now = Utc::now();
        let booking = draft(now).into_booking(CustomerId::new(), now);
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["status"], "pending");
        assert!(json["workerId"].is_null());
        assert_eq!(json["durationHours"], 4);
    }
}
