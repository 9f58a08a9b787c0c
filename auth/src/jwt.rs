//! HS256 token signing and verification.

use chrono::{Duration, Utc};
use crewbook_core::UserId;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::claims::{Claims, UserRole};
use crate::error::{AuthError, Result};

/// Verifies bearer tokens against a shared secret.
///
/// Tokens are minted by the account service; [`JwtService::issue`] exists
/// for tests and operator tooling.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create a service keyed by `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Sign a token for `user_id` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if encoding fails.
    pub fn issue(
        &self,
        user_id: UserId,
        email: impl Into<String>,
        user_type: UserRole,
        ttl: Duration,
    ) -> Result<String> {
        let claims = Claims {
            user_id,
            email: email.into(),
            user_type,
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Expired`] once `exp` has passed
    /// - [`AuthError::InvalidToken`] for any other verification failure
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can unwrap

    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let service = JwtService::new("test_secret_key");
        let user_id = UserId::new();

        let token = service
            .issue(user_id, "ana@example.com", UserRole::Customer, Duration::hours(1))
            .unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.user_type, UserRole::Customer);
    }

    #[test]
    fn test_garbage_token() {
        let service = JwtService::new("test_secret_key");
        assert!(matches!(
            service.verify("invalid_token"),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let signer = JwtService::new("secret1");
        let verifier = JwtService::new("secret2");

        let token = signer
            .issue(UserId::new(), "ana@example.com", UserRole::Worker, Duration::hours(1))
            .unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new("test_secret_key");
        // Past the default 60s leeway.
        let token = service
            .issue(UserId::new(), "ana@example.com", UserRole::Worker, Duration::minutes(-5))
            .unwrap();

        assert_eq!(service.verify(&token), Err(AuthError::Expired));
    }
}
