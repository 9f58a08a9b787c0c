//! Application Resolution Engine.
//!
//! Workers bid on open bookings; the customer accepts exactly one bid. The
//! accepted worker is assigned through [`BookingLifecycle::claim_open_booking`],
//! the same guarded primitive used by direct claims, so the two entry points
//! race safely against each other.
//!
//! # Sibling Sweep
//!
//! After an acceptance every other pending application on the booking is
//! rejected one row at a time. A failed sibling write is logged and
//! reported in [`AcceptedApplication::unresolved`] but does not fail the
//! acceptance, so a stale `pending` sibling can outlive the accept.

use serde::Serialize;
use std::sync::Arc;

use crate::application::{
    ApplicationDraft, ApplicationStatus, ApplicationWithBooking, ApplicationWithWorker,
    BookingApplication, BookingWithCustomer,
};
use crate::booking::Booking;
use crate::error::{MarketplaceError, Result, StoreError};
use crate::lifecycle::BookingLifecycle;
use crate::store::ApplicationStore;
use crate::types::{ApplicationId, BookingId, UserId, WorkerId};

/// Outcome of a successful acceptance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedApplication {
    /// The accepted application.
    pub application: BookingApplication,
    /// The booking, now assigned to the application's worker.
    pub booking: Booking,
    /// Siblings moved to `rejected` by the sweep.
    pub rejected: Vec<ApplicationId>,
    /// Siblings the sweep failed to write; still `pending`.
    pub unresolved: Vec<ApplicationId>,
}

/// Governs applications and the accept/reject protocol.
#[derive(Clone)]
pub struct ApplicationResolver {
    applications: Arc<dyn ApplicationStore>,
    lifecycle: BookingLifecycle,
}

impl ApplicationResolver {
    /// Create a resolver that assigns workers through `lifecycle`.
    #[must_use]
    pub fn new(applications: Arc<dyn ApplicationStore>, lifecycle: BookingLifecycle) -> Self {
        Self {
            applications,
            lifecycle,
        }
    }

    /// Submit a pending application from `worker_id`.
    ///
    /// Preconditions are checked in order: the booking exists, is open, has
    /// no worker, and the worker has not applied before.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::Validation`] for a negative or non-finite price
    /// - [`MarketplaceError::NotFound`]
    /// - [`MarketplaceError::NotAcceptingApplications`]
    /// - [`MarketplaceError::AlreadyAssigned`]
    /// - [`MarketplaceError::DuplicateApplication`], including when a
    ///   concurrent duplicate is caught by the store's uniqueness constraint
    pub async fn create_application(
        &self,
        worker_id: WorkerId,
        draft: ApplicationDraft,
    ) -> Result<BookingApplication> {
        draft.validate()?;

        let booking = self.lifecycle.get_booking(draft.booking_id).await?;
        if !booking.is_open {
            return Err(MarketplaceError::NotAcceptingApplications);
        }
        if booking.worker_id.is_some() {
            return Err(MarketplaceError::AlreadyAssigned);
        }
        if self.applications.exists_for(booking.id, worker_id).await? {
            return Err(MarketplaceError::DuplicateApplication);
        }

        let application = draft.into_application(worker_id, self.lifecycle.clock().now());
        match self.applications.insert(application.clone()).await {
            Ok(()) => {}
            Err(StoreError::UniqueViolation(_)) => {
                return Err(MarketplaceError::DuplicateApplication);
            }
            Err(e) => return Err(e.into()),
        }

        metrics::counter!("applications.created").increment(1);
        tracing::info!(
            application_id = %application.id,
            booking_id = %application.booking_id,
            worker_id = %worker_id,
            "Application submitted"
        );

        Ok(application)
    }

    /// Submit on behalf of the worker behind `user_id`, creating the worker
    /// record if absent.
    ///
    /// # Errors
    ///
    /// As [`Self::create_application`], plus [`MarketplaceError::ProfileNotFound`].
    pub async fn create_application_for_user(
        &self,
        user_id: UserId,
        draft: ApplicationDraft,
    ) -> Result<BookingApplication> {
        let worker_id = self.lifecycle.resolve_worker(user_id).await?;
        self.create_application(worker_id, draft).await
    }

    /// Applications to a booking, newest first, with the applicant's profile.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] if the booking does not exist.
    pub async fn booking_applications(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<ApplicationWithWorker>> {
        let booking = self.lifecycle.get_booking(booking_id).await?;
        let applications = self.applications.find_by_booking(booking.id).await?;

        let mut enriched = Vec::with_capacity(applications.len());
        for application in applications {
            let worker = self
                .lifecycle
                .identity()
                .worker_profile(application.worker_id)
                .await?;
            enriched.push(ApplicationWithWorker {
                application,
                worker,
            });
        }
        Ok(enriched)
    }

    /// Applications from `worker_id`, newest first, with booking and customer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Store`] if a lookup fails.
    pub async fn worker_applications(
        &self,
        worker_id: WorkerId,
    ) -> Result<Vec<ApplicationWithBooking>> {
        let applications = self.applications.find_by_worker(worker_id).await?;

        let mut enriched = Vec::with_capacity(applications.len());
        for application in applications {
            let booking = match self.lifecycle.get_booking(application.booking_id).await {
                Ok(booking) => {
                    let customer = self
                        .lifecycle
                        .identity()
                        .customer_profile(booking.customer_id)
                        .await?;
                    Some(BookingWithCustomer { booking, customer })
                }
                Err(MarketplaceError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };
            enriched.push(ApplicationWithBooking {
                application,
                booking,
            });
        }
        Ok(enriched)
    }

    /// Applications from the worker behind `user_id`.
    ///
    /// # Errors
    ///
    /// As [`Self::worker_applications`], plus [`MarketplaceError::ProfileNotFound`].
    pub async fn worker_applications_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ApplicationWithBooking>> {
        let worker_id = self.lifecycle.resolve_worker(user_id).await?;
        self.worker_applications(worker_id).await
    }

    /// Accept a pending application: assign its worker, mark it accepted,
    /// then reject every other pending sibling.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::NotFound`] if the application or booking is missing
    /// - [`MarketplaceError::InvalidState`] if the application is not pending
    /// - [`MarketplaceError::AlreadyAssigned`] if the booking already has a worker
    /// - [`MarketplaceError::AlreadyClaimed`] if another assignment won the race
    ///
    /// If the application cannot be marked accepted after the booking was
    /// claimed, the claim is released so the accept can be retried.
    pub async fn accept_application(&self, id: ApplicationId) -> Result<AcceptedApplication> {
        let application = self.find_application(id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(MarketplaceError::InvalidState {
                status: application.status,
                attempted: ApplicationStatus::Accepted,
            });
        }

        let booking = self.lifecycle.get_booking(application.booking_id).await?;
        if booking.worker_id.is_some() {
            return Err(MarketplaceError::AlreadyAssigned);
        }

        let worker_id = application.worker_id;
        let booking = self
            .lifecycle
            .claim_open_booking(booking.id, worker_id)
            .await?;
        let application = match self.mark_accepted(application).await {
            Ok(application) => application,
            Err(e) => {
                self.undo_assignment(booking.id, worker_id, &e).await;
                return Err(e);
            }
        };

        metrics::counter!("applications.accepted").increment(1);
        tracing::info!(
            application_id = %application.id,
            booking_id = %booking.id,
            worker_id = %application.worker_id,
            "Application accepted"
        );

        let (rejected, unresolved) = self.reject_siblings(&application).await;

        Ok(AcceptedApplication {
            application,
            booking,
            rejected,
            unresolved,
        })
    }

    /// Reject a pending application. The booking is untouched.
    ///
    /// # Errors
    ///
    /// - [`MarketplaceError::NotFound`] if the application is missing
    /// - [`MarketplaceError::InvalidState`] if it is not pending
    pub async fn reject_application(&self, id: ApplicationId) -> Result<BookingApplication> {
        let application = self.find_application(id).await?;
        if application.status != ApplicationStatus::Pending {
            return Err(MarketplaceError::InvalidState {
                status: application.status,
                attempted: ApplicationStatus::Rejected,
            });
        }

        let now = self.lifecycle.clock().now();
        if !self
            .applications
            .transition_status(
                id,
                ApplicationStatus::Pending,
                ApplicationStatus::Rejected,
                now,
            )
            .await?
        {
            let current = self.find_application(id).await?;
            return Err(MarketplaceError::InvalidState {
                status: current.status,
                attempted: ApplicationStatus::Rejected,
            });
        }

        metrics::counter!("applications.rejected", "via" => "customer").increment(1);
        tracing::info!(application_id = %id, "Application rejected");
        self.find_application(id).await
    }

    async fn find_application(&self, id: ApplicationId) -> Result<BookingApplication> {
        self.applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| MarketplaceError::application_not_found(id))
    }

    /// The booking is already assigned to this application's worker, so the
    /// application must end up accepted even if it was rejected in between.
    async fn mark_accepted(&self, application: BookingApplication) -> Result<BookingApplication> {
        let now = self.lifecycle.clock().now();
        let mut from = ApplicationStatus::Pending;

        for _ in 0..2 {
            if self
                .applications
                .transition_status(application.id, from, ApplicationStatus::Accepted, now)
                .await?
            {
                return self.find_application(application.id).await;
            }

            let current = self.find_application(application.id).await?;
            if current.status == ApplicationStatus::Accepted {
                return Ok(current);
            }
            tracing::warn!(
                application_id = %application.id,
                status = %current.status,
                "Application changed while its worker was being assigned"
            );
            from = current.status;
        }

        let current = self.find_application(application.id).await?;
        if current.status == ApplicationStatus::Accepted {
            return Ok(current);
        }
        Err(MarketplaceError::InvalidState {
            status: current.status,
            attempted: ApplicationStatus::Accepted,
        })
    }

    async fn undo_assignment(
        &self,
        booking_id: BookingId,
        worker_id: WorkerId,
        cause: &MarketplaceError,
    ) {
        match self.lifecycle.release_claim(booking_id, worker_id).await {
            Ok(true) => {
                tracing::warn!(
                    booking_id = %booking_id,
                    worker_id = %worker_id,
                    error = %cause,
                    "Acceptance failed, booking reopened"
                );
            }
            Ok(false) => {
                tracing::warn!(
                    booking_id = %booking_id,
                    worker_id = %worker_id,
                    error = %cause,
                    "Acceptance failed and booking changed before it could be reopened"
                );
            }
            Err(e) => {
                metrics::counter!("applications.accept_rollback_failures").increment(1);
                tracing::error!(
                    booking_id = %booking_id,
                    worker_id = %worker_id,
                    error = %e,
                    cause = %cause,
                    "Acceptance failed and claim could not be released"
                );
            }
        }
    }

    async fn reject_siblings(
        &self,
        accepted: &BookingApplication,
    ) -> (Vec<ApplicationId>, Vec<ApplicationId>) {
        let mut rejected = Vec::new();
        let mut unresolved = Vec::new();

        let siblings = match self.applications.find_by_booking(accepted.booking_id).await {
            Ok(siblings) => siblings,
            Err(e) => {
                metrics::counter!("applications.sweep_failures").increment(1);
                tracing::warn!(
                    booking_id = %accepted.booking_id,
                    error = %e,
                    "Could not load sibling applications for rejection"
                );
                return (rejected, unresolved);
            }
        };

        let now = self.lifecycle.clock().now();
        for sibling in siblings
            .into_iter()
            .filter(|a| a.id != accepted.id && a.status == ApplicationStatus::Pending)
        {
            match self
                .applications
                .transition_status(
                    sibling.id,
                    ApplicationStatus::Pending,
                    ApplicationStatus::Rejected,
                    now,
                )
                .await
            {
                Ok(true) => {
                    metrics::counter!("applications.rejected", "via" => "sweep").increment(1);
                    rejected.push(sibling.id);
                }
                Ok(false) => {
                    tracing::debug!(application_id = %sibling.id, "Sibling already resolved");
                }
                Err(e) => {
                    metrics::counter!("applications.sweep_failures").increment(1);
                    tracing::warn!(
                        application_id = %sibling.id,
                        booking_id = %accepted.booking_id,
                        error = %e,
                        "Failed to reject sibling application"
                    );
                    unresolved.push(sibling.id);
                }
            }
        }

        (rejected, unresolved)
    }
}
