//! # Crewbook Testing
//!
//! In-memory stores, deterministic clocks and fixtures for exercising the
//! booking and application engines without a database.
//!
//! ```
//! use crewbook_testing::Marketplace;
//!
//! # tokio_test::block_on(async {
//! let market = Marketplace::new();
//! let (customer, _) = market.identity.register_customer("Ada", "Lovelace");
//! let booking = market
//!     .lifecycle
//!     .create_booking_for_user(customer, market.open_draft())
//!     .await
//!     .unwrap();
//! assert!(booking.is_open);
//! # });
//! ```

pub mod fixtures;
pub mod identity;
pub mod stores;

use chrono::{DateTime, Duration, Utc};
use crewbook_core::environment::Clock;
use crewbook_core::{ApplicationResolver, BookingDraft, BookingLifecycle};
use std::sync::{Arc, Mutex};

pub use identity::InMemoryIdentityResolver;
pub use stores::{InMemoryApplicationStore, InMemoryBookingStore};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Arc, Clock, DateTime, Duration, Mutex, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use crewbook_testing::mocks::FixedClock;
    /// use crewbook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Clock that only moves when told to.
    ///
    /// Shares its time across clones, so a test can advance the clock an
    /// engine is holding.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Start at `time`.
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move forward by `by`.
        pub fn advance(&self, by: Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new(epoch())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.lock().map_or_else(|_| epoch(), |t| *t)
        }
    }
}

pub use mocks::{FixedClock, ManualClock, test_clock};

/// Both engines wired to in-memory stores and a [`ManualClock`].
///
/// The stores are exposed so tests can inspect state directly or inject
/// failures.
#[derive(Clone)]
pub struct Marketplace {
    /// Shared clock.
    pub clock: ManualClock,
    /// Booking store.
    pub bookings: InMemoryBookingStore,
    /// Application store.
    pub applications: InMemoryApplicationStore,
    /// Identity directory.
    pub identity: InMemoryIdentityResolver,
    /// Booking Lifecycle Engine.
    pub lifecycle: BookingLifecycle,
    /// Application Resolution Engine.
    pub resolver: ApplicationResolver,
}

impl Marketplace {
    /// Fresh, empty marketplace at 2025-01-01.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::default();
        let bookings = InMemoryBookingStore::new();
        let applications = InMemoryApplicationStore::new();
        let identity = InMemoryIdentityResolver::new();

        let lifecycle = BookingLifecycle::new(
            Arc::new(bookings.clone()),
            Arc::new(identity.clone()),
            Arc::new(clock.clone()),
        );
        let resolver = ApplicationResolver::new(Arc::new(applications.clone()), lifecycle.clone());

        Self {
            clock,
            bookings,
            applications,
            identity,
            lifecycle,
            resolver,
        }
    }

    /// Open booking draft scheduled a week from the current clock.
    #[must_use]
    pub fn open_draft(&self) -> BookingDraft {
        fixtures::open_draft(self.clock.now())
    }

    /// Advance the clock by a second between steps so ordering by time is stable.
    pub fn tick(&self) {
        self.clock.advance(Duration::seconds(1));
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}
