//! Token claims.

use crewbook_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account type carried in the `userType` claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Posts bookings and accepts applications.
    Customer,
    /// Claims or applies to bookings.
    Worker,
    /// Back-office account.
    Admin,
}

impl UserRole {
    /// Wire value of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Worker => "worker",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims issued by the account service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Account the token was issued to
    pub user_id: UserId,
    /// Account email, for logging
    pub email: String,
    /// Account type
    pub user_type: UserRole,
    /// Expiration (seconds since the Unix epoch)
    pub exp: i64,
}

impl Claims {
    /// Whether the token belongs to a customer account.
    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.user_type == UserRole::Customer
    }

    /// Whether the token belongs to a worker account.
    #[must_use]
    pub fn is_worker(&self) -> bool {
        self.user_type == UserRole::Worker
    }
}
