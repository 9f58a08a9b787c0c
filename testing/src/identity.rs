//! In-memory identity directory.

use crewbook_core::{
    CustomerId, CustomerProfile, IdentityResolver, StoreError, StoreFuture, UserId, WorkerId,
    WorkerProfile,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct User {
    first_name: String,
    last_name: String,
    email: String,
}

#[derive(Debug, Default)]
struct Directory {
    users: HashMap<UserId, User>,
    customers: HashMap<UserId, CustomerProfile>,
    workers: HashMap<UserId, WorkerProfile>,
}

/// In-memory [`IdentityResolver`].
///
/// Users are registered up front; worker records are created lazily by
/// [`IdentityResolver::ensure_worker_for_user`], just like the real directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityResolver {
    directory: Arc<Mutex<Directory>>,
}

impl InMemoryIdentityResolver {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user account with no role records.
    #[must_use]
    pub fn register_user(&self, first_name: &str, last_name: &str) -> UserId {
        let user_id = UserId::new();
        if let Ok(mut directory) = self.directory.lock() {
            directory.users.insert(
                user_id,
                User {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: format!(
                        "{}.{}@example.com",
                        first_name.to_lowercase(),
                        last_name.to_lowercase()
                    ),
                },
            );
        }
        user_id
    }

    /// Register a user with a customer record.
    #[must_use]
    pub fn register_customer(&self, first_name: &str, last_name: &str) -> (UserId, CustomerId) {
        let user_id = self.register_user(first_name, last_name);
        let customer_id = CustomerId::new();
        if let Ok(mut directory) = self.directory.lock() {
            if let Some(user) = directory.users.get(&user_id).cloned() {
                directory.customers.insert(
                    user_id,
                    CustomerProfile {
                        id: customer_id,
                        user_id,
                        first_name: user.first_name,
                        last_name: user.last_name,
                        email: user.email,
                    },
                );
            }
        }
        (user_id, customer_id)
    }

    /// Register a user with a worker record of the given specialty.
    #[must_use]
    pub fn register_worker(&self, first_name: &str, specialty: &str) -> (UserId, WorkerId) {
        let user_id = self.register_user(first_name, "Builder");
        let worker_id = WorkerId::new();
        if let Ok(mut directory) = self.directory.lock() {
            directory.workers.insert(
                user_id,
                WorkerProfile {
                    id: worker_id,
                    user_id,
                    first_name: first_name.to_string(),
                    last_name: "Builder".to_string(),
                    specialty: specialty.to_string(),
                    availability_status: "available".to_string(),
                },
            );
        }
        (user_id, worker_id)
    }

    fn with_directory<T>(&self, f: impl FnOnce(&mut Directory) -> T) -> Result<T, StoreError> {
        let mut directory = self
            .directory
            .lock()
            .map_err(|_| StoreError::DatabaseError("identity directory lock poisoned".into()))?;
        Ok(f(&mut directory))
    }
}

impl IdentityResolver for InMemoryIdentityResolver {
    fn customer_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<CustomerId>> {
        Box::pin(async move { self.with_directory(|d| d.customers.get(&user_id).map(|c| c.id)) })
    }

    fn worker_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<WorkerId>> {
        Box::pin(async move { self.with_directory(|d| d.workers.get(&user_id).map(|w| w.id)) })
    }

    fn ensure_worker_for_user(&self, user_id: UserId) -> StoreFuture<'_, Option<WorkerId>> {
        Box::pin(async move {
            self.with_directory(|d| {
                if let Some(worker) = d.workers.get(&user_id) {
                    return Some(worker.id);
                }
                let user = d.users.get(&user_id)?.clone();
                let worker = WorkerProfile {
                    id: WorkerId::new(),
                    user_id,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    specialty: String::new(),
                    availability_status: "available".to_string(),
                };
                let id = worker.id;
                d.workers.insert(user_id, worker);
                Some(id)
            })
        })
    }

    fn customer_profile(&self, id: CustomerId) -> StoreFuture<'_, Option<CustomerProfile>> {
        Box::pin(async move { self.with_directory(|d| d.customers.values().find(|c| c.id == id).cloned()) })
    }

    fn worker_profile(&self, id: WorkerId) -> StoreFuture<'_, Option<WorkerProfile>> {
        Box::pin(async move { self.with_directory(|d| d.workers.values().find(|w| w.id == id).cloned()) })
    }
}
