//! Business metrics for the marketplace.
//!
//! The engines in `crewbook-core` record these through the `metrics`
//! facade; this module only describes them for the Prometheus exporter.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `bookings.created{open}` - Bookings created, direct or open
//! - `bookings.transitions{to}` - Checked status transitions by target status
//! - `bookings.claims{outcome}` - Claim attempts, `won` or `lost`
//! - `bookings.status_overrides` - Unchecked status writes
//! - `applications.created` - Applications submitted
//! - `applications.accepted` - Applications accepted
//! - `applications.rejected{via}` - Rejections by the customer or the sibling sweep
//! - `applications.sweep_failures` - Sibling rejections that could not be written

use metrics::describe_counter;

/// Register all business metric descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!("bookings.created", "Bookings created, labelled by whether they are open");
    describe_counter!(
        "bookings.transitions",
        "Checked booking status transitions, labelled by target status"
    );
    describe_counter!("bookings.claims", "Open booking claim attempts by outcome");
    describe_counter!(
        "bookings.status_overrides",
        "Administrative status writes that bypassed transition checks"
    );

    describe_counter!("applications.created", "Applications submitted by workers");
    describe_counter!("applications.accepted", "Applications accepted by customers");
    describe_counter!(
        "applications.rejected",
        "Applications rejected, by the customer or by the sweep after an acceptance"
    );
    describe_counter!(
        "applications.sweep_failures",
        "Sibling applications left pending because their rejection failed"
    );
    describe_counter!(
        "applications.accept_rollback_failures",
        "Failed acceptances whose booking claim could not be released"
    );

    tracing::info!("Business metrics registered");
}
