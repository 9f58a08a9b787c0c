//! # Crewbook Core
//!
//! Booking lifecycle and application resolution for a marketplace that
//! connects customers with construction workers.
//!
//! ## Components
//!
//! - **Stores** ([`store`]): durable records of bookings and applications,
//!   exposing guarded compare-and-swap writes
//! - **Identity** ([`identity`]): maps an authenticated user onto a customer
//!   or worker record
//! - **Booking Lifecycle Engine** ([`lifecycle`]): the booking state machine
//!   and the single worker-assignment primitive
//! - **Application Resolution Engine** ([`resolution`]): worker bids and
//!   the accept/reject protocol
//!
//! ## Example
//!
//! ```ignore
//! use crewbook_core::{BookingLifecycle, ApplicationResolver, environment::SystemClock};
//!
//! let lifecycle = BookingLifecycle::new(bookings, identity, Arc::new(SystemClock));
//! let resolver = ApplicationResolver::new(applications, lifecycle.clone());
//!
//! let booking = lifecycle.create_booking_for_user(customer_user, draft).await?;
//! let bid = resolver.create_application_for_user(worker_user, bid_draft).await?;
//! let outcome = resolver.accept_application(bid.id).await?;
//! assert_eq!(outcome.booking.worker_id, Some(bid.worker_id));
//! ```

pub mod application;
pub mod booking;
pub mod environment;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod resolution;
pub mod store;
pub mod types;

pub use application::{
    ApplicationDraft, ApplicationStatus, ApplicationWithBooking, ApplicationWithWorker,
    BookingApplication, BookingWithCustomer,
};
pub use booking::{Booking, BookingAction, BookingDraft, BookingStatus};
pub use error::{MarketplaceError, ProfileRole, Result, StoreError};
pub use identity::{CustomerProfile, IdentityResolver, WorkerProfile};
pub use lifecycle::{BookingLifecycle, StatusOverride};
pub use resolution::{AcceptedApplication, ApplicationResolver};
pub use store::{ApplicationStore, BookingStore, StoreFuture};
pub use types::{ApplicationId, BookingId, CustomerId, UserId, WorkerId};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
