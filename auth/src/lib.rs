//! # Crewbook Auth
//!
//! Bearer-token authentication for the Crewbook API.
//!
//! Tokens are HS256 JWTs issued by the account service and carry
//! `userId`, `email`, `userType` and `exp`. This crate only verifies them:
//!
//! - [`JwtService`] checks signature and expiry
//! - [`AuthUser`] admits any valid token
//! - [`RequireCustomer`] and [`RequireWorker`] additionally check `userType`
//!
//! Missing or invalid tokens are rejected with 401, a role mismatch with 403.

pub mod claims;
pub mod error;
pub mod extractors;
pub mod jwt;

pub use claims::{Claims, UserRole};
pub use error::{AuthError, Result};
pub use extractors::{AuthUser, BearerToken, RequireCustomer, RequireWorker};
pub use jwt::JwtService;
