//! Application Resolution Engine behavior against in-memory stores.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use crewbook_core::environment::Clock;
use crewbook_core::{
    ApplicationId, ApplicationResolver, ApplicationStatus, ApplicationStore, Booking,
    BookingApplication, BookingId, BookingStatus, DateTime, MarketplaceError, StoreFuture, UserId,
    Utc, WorkerId,
};
use crewbook_testing::{InMemoryApplicationStore, Marketplace, fixtures};
use std::sync::Arc;

async fn open_booking(market: &Marketplace) -> (UserId, Booking) {
    let (user, _) = market.identity.register_customer("Grace", "Hopper");
    let booking = market
        .lifecycle
        .create_booking_for_user(user, market.open_draft())
        .await
        .unwrap();
    (user, booking)
}

#[tokio::test]
async fn test_create_application_is_pending() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let worker = WorkerId::new();

    let application = market
        .resolver
        .create_application(worker, fixtures::application_draft(booking.id))
        .await
        .unwrap();

    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.worker_id, worker);
    assert_eq!(application.booking_id, booking.id);
}

#[tokio::test]
async fn test_duplicate_application() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let worker = WorkerId::new();

    market
        .resolver
        .create_application(worker, fixtures::application_draft(booking.id))
        .await
        .unwrap();
    let err = market
        .resolver
        .create_application(worker, fixtures::application_draft(booking.id))
        .await
        .unwrap_err();

    assert_eq!(err, MarketplaceError::DuplicateApplication);
}

#[tokio::test]
async fn test_application_to_missing_booking() {
    let market = Marketplace::new();
    let err = market
        .resolver
        .create_application(
            WorkerId::new(),
            fixtures::application_draft(crewbook_core::BookingId::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::NotFound {
            resource: "booking",
            ..
        }
    ));
}

#[tokio::test]
async fn test_application_to_direct_booking() {
    let market = Marketplace::new();
    let (user, _) = market.identity.register_customer("Grace", "Hopper");
    let booking = market
        .lifecycle
        .create_booking_for_user(user, fixtures::direct_draft(WorkerId::new(), market.clock.now()))
        .await
        .unwrap();

    let err = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap_err();
    assert_eq!(err, MarketplaceError::NotAcceptingApplications);
}

#[tokio::test]
async fn test_application_after_claim() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    market
        .lifecycle
        .claim_open_booking(booking.id, WorkerId::new())
        .await
        .unwrap();

    // Claiming closes the booking, so the open check fires first.
    let err = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap_err();
    assert_eq!(err, MarketplaceError::NotAcceptingApplications);
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let mut draft = fixtures::application_draft(booking.id);
    draft.proposed_price = -5.0;

    let err = market
        .resolver
        .create_application(WorkerId::new(), draft)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Validation(_)));
}

#[tokio::test]
async fn test_accept_resolves_all_siblings() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;

    let mut applications = Vec::new();
    for _ in 0..3 {
        applications.push(
            market
                .resolver
                .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
                .await
                .unwrap(),
        );
        market.tick();
    }
    let chosen = applications[1].clone();

    let outcome = market.resolver.accept_application(chosen.id).await.unwrap();

    assert_eq!(outcome.application.status, ApplicationStatus::Accepted);
    assert_eq!(outcome.booking.worker_id, Some(chosen.worker_id));
    assert!(!outcome.booking.is_open);
    assert_eq!(outcome.rejected.len(), 2);
    assert!(outcome.unresolved.is_empty());

    for application in &applications {
        let stored = market.applications.get(application.id).unwrap();
        let expected = if application.id == chosen.id {
            ApplicationStatus::Accepted
        } else {
            ApplicationStatus::Rejected
        };
        assert_eq!(stored.status, expected);
    }
    assert_eq!(
        market.bookings.get(booking.id).unwrap().worker_id,
        Some(chosen.worker_id)
    );
}

#[tokio::test]
async fn test_reject_after_accept_scenario() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let w1 = WorkerId::new();
    let w2 = WorkerId::new();
    let a1 = market
        .resolver
        .create_application(w1, fixtures::application_draft(booking.id))
        .await
        .unwrap();
    let a2 = market
        .resolver
        .create_application(w2, fixtures::application_draft(booking.id))
        .await
        .unwrap();

    market.resolver.accept_application(a1.id).await.unwrap();

    assert_eq!(market.bookings.get(booking.id).unwrap().worker_id, Some(w1));
    assert_eq!(
        market.applications.get(a1.id).unwrap().status,
        ApplicationStatus::Accepted
    );
    assert_eq!(
        market.applications.get(a2.id).unwrap().status,
        ApplicationStatus::Rejected
    );
}

#[tokio::test]
async fn test_accept_twice_is_invalid_state() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let application = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    market
        .resolver
        .accept_application(application.id)
        .await
        .unwrap();

    let err = market
        .resolver
        .accept_application(application.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        MarketplaceError::InvalidState {
            status: ApplicationStatus::Accepted,
            attempted: ApplicationStatus::Accepted,
        }
    );
}

#[tokio::test]
async fn test_accept_after_direct_claim_is_already_assigned() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let application = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();

    let claimer = WorkerId::new();
    market
        .lifecycle
        .claim_open_booking(booking.id, claimer)
        .await
        .unwrap();

    let err = market
        .resolver
        .accept_application(application.id)
        .await
        .unwrap_err();
    assert_eq!(err, MarketplaceError::AlreadyAssigned);
    assert_eq!(
        market.applications.get(application.id).unwrap().status,
        ApplicationStatus::Pending
    );
    assert_eq!(market.bookings.get(booking.id).unwrap().worker_id, Some(claimer));
}

#[tokio::test]
async fn test_accept_on_cancelled_booking_loses_claim() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let application = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    market.lifecycle.cancel_booking(booking.id).await.unwrap();

    let err = market
        .resolver
        .accept_application(application.id)
        .await
        .unwrap_err();
    assert_eq!(err, MarketplaceError::AlreadyClaimed);
    assert_eq!(
        market.applications.get(application.id).unwrap().status,
        ApplicationStatus::Pending
    );
    assert_eq!(
        market.bookings.get(booking.id).unwrap().status,
        BookingStatus::Cancelled
    );
}

#[tokio::test]
async fn test_sibling_sweep_tolerates_failures() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let chosen = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    let stuck = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    let fine = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    market.applications.fail_status_writes_for(stuck.id);

    let outcome = market.resolver.accept_application(chosen.id).await.unwrap();

    assert_eq!(outcome.rejected, vec![fine.id]);
    assert_eq!(outcome.unresolved, vec![stuck.id]);
    assert_eq!(
        market.applications.get(stuck.id).unwrap().status,
        ApplicationStatus::Pending
    );
    assert_eq!(
        market.bookings.get(booking.id).unwrap().worker_id,
        Some(chosen.worker_id)
    );
}

#[tokio::test]
async fn test_failed_accept_write_reopens_booking() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let chosen = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    let sibling = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();
    market.applications.fail_status_writes_for(chosen.id);

    let result = market.resolver.accept_application(chosen.id).await;
    assert!(matches!(result, Err(MarketplaceError::Store(_))));

    let stored = market.bookings.get(booking.id).unwrap();
    assert_eq!(stored.worker_id, None);
    assert!(stored.is_open);
    assert_eq!(stored.status, BookingStatus::Pending);
    for id in [chosen.id, sibling.id] {
        assert_eq!(
            market.applications.get(id).unwrap().status,
            ApplicationStatus::Pending
        );
    }

    market.applications.heal_status_writes_for(chosen.id);
    let outcome = market.resolver.accept_application(chosen.id).await.unwrap();
    assert_eq!(outcome.application.status, ApplicationStatus::Accepted);
    assert_eq!(outcome.booking.worker_id, Some(chosen.worker_id));
    assert_eq!(outcome.rejected, vec![sibling.id]);
}

/// Application store whose writes to `accepted` never land.
#[derive(Clone)]
struct AcceptNeverLands(InMemoryApplicationStore);

impl ApplicationStore for AcceptNeverLands {
    fn insert(&self, application: BookingApplication) -> StoreFuture<'_, ()> {
        self.0.insert(application)
    }

    fn find_by_id(&self, id: ApplicationId) -> StoreFuture<'_, Option<BookingApplication>> {
        self.0.find_by_id(id)
    }

    fn find_by_booking(&self, booking_id: BookingId) -> StoreFuture<'_, Vec<BookingApplication>> {
        self.0.find_by_booking(booking_id)
    }

    fn find_by_worker(&self, worker_id: WorkerId) -> StoreFuture<'_, Vec<BookingApplication>> {
        self.0.find_by_worker(worker_id)
    }

    fn exists_for(&self, booking_id: BookingId, worker_id: WorkerId) -> StoreFuture<'_, bool> {
        self.0.exists_for(booking_id, worker_id)
    }

    fn transition_status(
        &self,
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, bool> {
        if to == ApplicationStatus::Accepted {
            return Box::pin(async { Ok(false) });
        }
        self.0.transition_status(id, from, to, at)
    }
}

#[tokio::test]
async fn test_accept_that_never_lands_is_an_error_not_a_success() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let resolver = ApplicationResolver::new(
        Arc::new(AcceptNeverLands(market.applications.clone())),
        market.lifecycle.clone(),
    );
    let application = resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();

    let result = resolver.accept_application(application.id).await;

    assert!(matches!(
        result,
        Err(MarketplaceError::InvalidState {
            status: ApplicationStatus::Pending,
            attempted: ApplicationStatus::Accepted,
        })
    ));
    let stored = market.bookings.get(booking.id).unwrap();
    assert_eq!(stored.worker_id, None);
    assert!(stored.is_open);
}

#[tokio::test]
async fn test_reject_application() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let application = market
        .resolver
        .create_application(WorkerId::new(), fixtures::application_draft(booking.id))
        .await
        .unwrap();

    let rejected = market
        .resolver
        .reject_application(application.id)
        .await
        .unwrap();
    assert_eq!(rejected.status, ApplicationStatus::Rejected);

    // The booking is untouched and still open.
    let stored = market.bookings.get(booking.id).unwrap();
    assert!(stored.is_open);
    assert_eq!(stored.worker_id, None);

    let err = market
        .resolver
        .reject_application(application.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::InvalidState {
            status: ApplicationStatus::Rejected,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unknown_application_is_not_found() {
    let market = Marketplace::new();
    let missing = ApplicationId::new();
    assert!(matches!(
        market.resolver.accept_application(missing).await,
        Err(MarketplaceError::NotFound {
            resource: "application",
            ..
        })
    ));
    assert!(matches!(
        market.resolver.reject_application(missing).await,
        Err(MarketplaceError::NotFound {
            resource: "application",
            ..
        })
    ));
}

#[tokio::test]
async fn test_booking_applications_include_worker_profile() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let (w1_user, w1) = market.identity.register_worker("Ann", "tiling");
    let w2_user = market.identity.register_user("Ben", "Stone");

    market
        .resolver
        .create_application_for_user(w1_user, fixtures::application_draft(booking.id))
        .await
        .unwrap();
    market.tick();
    let second = market
        .resolver
        .create_application_for_user(w2_user, fixtures::application_draft(booking.id))
        .await
        .unwrap();

    let listed = market
        .resolver
        .booking_applications(booking.id)
        .await
        .unwrap();

    assert_eq!(listed.len(), 2);
    // Newest first.
    assert_eq!(listed[0].application.id, second.id);
    assert_eq!(listed[0].worker.as_ref().unwrap().first_name, "Ben");
    assert_eq!(listed[1].worker.as_ref().unwrap().id, w1);
    assert_eq!(listed[1].worker.as_ref().unwrap().specialty, "tiling");
}

#[tokio::test]
async fn test_worker_applications_include_booking_and_customer() {
    let market = Marketplace::new();
    let (_, booking) = open_booking(&market).await;
    let worker_user = market.identity.register_user("Ben", "Stone");

    market
        .resolver
        .create_application_for_user(worker_user, fixtures::application_draft(booking.id))
        .await
        .unwrap();

    let mine = market
        .resolver
        .worker_applications_for_user(worker_user)
        .await
        .unwrap();

    assert_eq!(mine.len(), 1);
    let enriched = mine[0].booking.as_ref().unwrap();
    assert_eq!(enriched.booking.id, booking.id);
    assert_eq!(enriched.customer.as_ref().unwrap().first_name, "Grace");

    let json = serde_json::to_value(&mine[0]).unwrap();
    assert_eq!(json["status"], "pending");
    assert_eq!(json["booking"]["title"], booking.title);
    assert_eq!(json["booking"]["customer"]["lastName"], "Hopper");
}
