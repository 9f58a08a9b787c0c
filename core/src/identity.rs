//! Customer and worker identity, resolved from an authenticated user.
//!
//! Profile CRUD lives outside this crate. The engines only need to turn a
//! [`UserId`] into a customer or worker record, and to look records up for
//! display.

use serde::{Deserialize, Serialize};

use crate::store::StoreFuture;
use crate::types::{CustomerId, UserId, WorkerId};

/// Public view of a customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    /// Customer record id.
    pub id: CustomerId,
    /// Owning user account.
    pub user_id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
}

/// Public view of a worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfile {
    /// Worker record id.
    pub id: WorkerId,
    /// Owning user account.
    pub user_id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Trade, e.g. "plumbing".
    pub specialty: String,
    /// Availability as shown to customers.
    pub availability_status: String,
}

/// Maps authenticated users onto marketplace records.
///
/// Lookups return `Ok(None)` when no record exists; the engines turn that
/// into `ProfileNotFound`.
pub trait IdentityResolver: Send + Sync {
    /// Customer record owned by `user_id`.
    fn customer_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<CustomerId>>;

    /// Worker record owned by `user_id`.
    fn worker_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<WorkerId>>;

    /// Worker record owned by `user_id`, created with default availability
    /// if absent. `None` only when the user account itself is missing.
    fn ensure_worker_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<WorkerId>>;

    /// Display data for a customer.
    fn customer_profile(&self, id: CustomerId) -> StoreFuture<'_, Option<CustomerProfile>>;

    /// Display data for a worker.
    fn worker_profile(&self, id: WorkerId) -> StoreFuture<'_, Option<WorkerProfile>>;
}
