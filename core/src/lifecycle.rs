//! Booking Lifecycle Engine.
//!
//! Owns every rule about a booking's status and worker assignment. All
//! writes go through the guarded store primitives in [`crate::store`]; a
//! zero-row result is re-read so the caller gets a precise error
//! (`NotFound`, `InvalidTransition` or `AlreadyClaimed`) instead of a silent
//! no-op.
//!
//! The unchecked status write lives behind [`BookingLifecycle::status_override`]
//! so it cannot be mistaken for one of the checked transitions.

use std::sync::Arc;

use crate::booking::{Booking, BookingAction, BookingDraft, BookingStatus};
use crate::environment::Clock;
use crate::error::{MarketplaceError, ProfileRole, Result};
use crate::identity::IdentityResolver;
use crate::store::BookingStore;
use crate::types::{BookingId, CustomerId, UserId, WorkerId};

/// Attempts at a checked transition before giving up on a contended booking.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// State machine for bookings.
#[derive(Clone)]
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingStore>,
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
}

impl BookingLifecycle {
    /// Create an engine over the given store, identity lookup and clock.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            identity,
            clock,
        }
    }

    /// Create a pending booking on behalf of the customer owned by `user_id`.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::ProfileNotFound`] if the user has no customer record
    /// - [`MarketplaceError::Validation`] if the draft is malformed or in the past
    /// - [`MarketplaceError::Store`] if persistence fails
    pub async fn create_booking_for_user(
        &self,
        user_id: UserId,
        draft: BookingDraft,
    ) -> Result<Booking> {
        let customer_id = self.resolve_customer(user_id).await?;
        let now = self.clock.now();
        draft.validate(now)?;

        let booking = draft.into_booking(customer_id, now);
        self.bookings.insert(booking.clone()).await?;

        let open = if booking.is_open { "true" } else { "false" };
        metrics::counter!("bookings.created", "open" => open).increment(1);
        tracing::info!(
            booking_id = %booking.id,
            customer_id = %customer_id,
            is_open = booking.is_open,
            "Booking created"
        );

        Ok(booking)
    }

    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] if no such booking exists.
    pub async fn get_booking(&self, id: BookingId) -> Result<Booking> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| MarketplaceError::booking_not_found(id))
    }

    /// Bookings owned by the customer behind `user_id`, latest date first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::ProfileNotFound`] if the user has no customer record.
    pub async fn customer_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let customer_id = self.resolve_customer(user_id).await?;
        Ok(self.bookings.find_by_customer(customer_id).await?)
    }

    /// Bookings assigned to the worker behind `user_id`, latest date first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::ProfileNotFound`] if the user has no worker record.
    pub async fn worker_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let worker_id = self
            .identity
            .worker_for_user(user_id)
            .await?
            .ok_or_else(|| MarketplaceError::ProfileNotFound {
                role: ProfileRole::Worker,
                user_id: user_id.to_string(),
            })?;
        self.worker_bookings(worker_id).await
    }

    /// Bookings assigned to `worker_id`, latest date first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Store`] if the query fails.
    pub async fn worker_bookings(&self, worker_id: WorkerId) -> Result<Vec<Booking>> {
        Ok(self.bookings.find_by_worker(worker_id).await?)
    }

    /// Every booking a worker may still claim or apply to, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Store`] if the query fails.
    pub async fn open_bookings(&self) -> Result<Vec<Booking>> {
        Ok(self.bookings.find_open().await?)
    }

    /// `pending` → `accepted`.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::NotFound`] or [`MarketplaceError::InvalidTransition`].
    pub async fn accept_booking(&self, id: BookingId) -> Result<Booking> {
        self.apply(id, BookingAction::Accept).await
    }

    /// `pending` → `declined`.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::NotFound`] or [`MarketplaceError::InvalidTransition`].
    pub async fn decline_booking(&self, id: BookingId) -> Result<Booking> {
        self.apply(id, BookingAction::Decline).await
    }

    /// `accepted` → `completed`.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::NotFound`] or [`MarketplaceError::InvalidTransition`].
    pub async fn complete_booking(&self, id: BookingId) -> Result<Booking> {
        self.apply(id, BookingAction::Complete).await
    }

    /// `pending` | `accepted` → `cancelled`. The row is kept.
    ///
    /// # Errors
    ///
    /// [`MarketplaceError::NotFound`] or [`MarketplaceError::InvalidTransition`].
    pub async fn cancel_booking(&self, id: BookingId) -> Result<Booking> {
        self.apply(id, BookingAction::Cancel).await
    }

    async fn apply(&self, id: BookingId, action: BookingAction) -> Result<Booking> {
        let mut current = self.get_booking(id).await?;

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let from = current.status;
            let Some(to) = from.next(action) else {
                return Err(MarketplaceError::InvalidTransition { action, from });
            };

            let now = self.clock.now();
            if self.bookings.transition_status(id, from, to, now).await? {
                metrics::counter!("bookings.transitions", "to" => to.as_str()).increment(1);
                tracing::info!(
                    booking_id = %id,
                    from = %from,
                    to = %to,
                    "Booking status changed"
                );
                return self.get_booking(id).await;
            }

            // Status moved underneath us; judge the action against the new one.
            current = self.get_booking(id).await?;
        }

        Err(MarketplaceError::InvalidTransition {
            action,
            from: current.status,
        })
    }

    /// Assign `worker_id` to an open booking if nobody beat them to it.
    ///
    /// This is the single assignment primitive: direct claims and accepted
    /// applications both end here.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::NotFound`] if the booking does not exist
    /// - [`MarketplaceError::AlreadyClaimed`] if the guarded write affected nothing
    pub async fn claim_open_booking(&self, id: BookingId, worker_id: WorkerId) -> Result<Booking> {
        let now = self.clock.now();
        if self.bookings.claim_open(id, worker_id, now).await? {
            metrics::counter!("bookings.claims", "outcome" => "won").increment(1);
            tracing::info!(booking_id = %id, worker_id = %worker_id, "Open booking claimed");
            return self.get_booking(id).await;
        }

        let current = self.get_booking(id).await?;
        metrics::counter!("bookings.claims", "outcome" => "lost").increment(1);
        tracing::warn!(
            booking_id = %id,
            worker_id = %worker_id,
            status = %current.status,
            assigned = ?current.worker_id,
            "Claim rejected, booking no longer open"
        );
        Err(MarketplaceError::AlreadyClaimed)
    }

    /// Undo a claim by `worker_id` whose follow-up write failed, reopening
    /// the booking. Returns `false` if the booking moved on in the meantime.
    pub(crate) async fn release_claim(&self, id: BookingId, worker_id: WorkerId) -> Result<bool> {
        let now = self.clock.now();
        let released = self.bookings.release_claim(id, worker_id, now).await?;
        if released {
            metrics::counter!("bookings.claims", "outcome" => "released").increment(1);
            tracing::info!(booking_id = %id, worker_id = %worker_id, "Claim released");
        }
        Ok(released)
    }

    /// Claim on behalf of the worker behind `user_id`, creating the worker
    /// record if this is the user's first action as a worker.
    ///
    /// # Errors
    ///
    /// As [`Self::claim_open_booking`], plus [`MarketplaceError::ProfileNotFound`].
    pub async fn claim_open_booking_for_user(
        &self,
        id: BookingId,
        user_id: UserId,
    ) -> Result<Booking> {
        let worker_id = self.resolve_worker(user_id).await?;
        self.claim_open_booking(id, worker_id).await
    }

    /// Unchecked status writes for administrative use.
    #[must_use]
    pub const fn status_override(&self) -> StatusOverride<'_> {
        StatusOverride { lifecycle: self }
    }

    /// Worker record for `user_id`, created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::ProfileNotFound`] if the user account does not exist.
    pub async fn resolve_worker(&self, user_id: UserId) -> Result<WorkerId> {
        self.identity
            .ensure_worker_for_user(user_id)
            .await?
            .ok_or_else(|| MarketplaceError::ProfileNotFound {
                role: ProfileRole::Worker,
                user_id: user_id.to_string(),
            })
    }

    /// Customer record for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::ProfileNotFound`] if none exists.
    pub async fn resolve_customer(&self, user_id: UserId) -> Result<CustomerId> {
        self.identity
            .customer_for_user(user_id)
            .await?
            .ok_or_else(|| MarketplaceError::ProfileNotFound {
                role: ProfileRole::Customer,
                user_id: user_id.to_string(),
            })
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn identity(&self) -> &dyn IdentityResolver {
        self.identity.as_ref()
    }
}

/// Writes any status with no transition validation.
///
/// Obtained from [`BookingLifecycle::status_override`]. The only guarantee
/// kept is that a booking which leaves `pending` is no longer open.
pub struct StatusOverride<'a> {
    lifecycle: &'a BookingLifecycle,
}

impl StatusOverride<'_> {
    /// Force `id` into `status`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] if no such booking exists.
    pub async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking> {
        let now = self.lifecycle.clock.now();
        if !self
            .lifecycle
            .bookings
            .overwrite_status(id, status, now)
            .await?
        {
            return Err(MarketplaceError::booking_not_found(id));
        }

        metrics::counter!("bookings.status_overrides").increment(1);
        tracing::warn!(booking_id = %id, to = %status, "Booking status overridden");
        self.lifecycle.get_booking(id).await
    }
}
