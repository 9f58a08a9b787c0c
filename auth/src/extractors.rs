//! Axum extractors for authenticated requests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crewbook_auth::{AuthUser, RequireWorker};
//!
//! // Any valid token
//! async fn update_status(user: AuthUser) -> Result<Json<Response>, AppError> { ... }
//!
//! // Worker tokens only; customers get 403
//! async fn claim(worker: RequireWorker) -> Result<Json<Response>, AppError> { ... }
//! ```
//!
//! The router state must hand out the shared [`JwtService`] through
//! [`FromRef`].

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use crewbook_core::UserId;
use crewbook_web::AppError;
use std::sync::Arc;

use crate::claims::{Claims, UserRole};
use crate::error::AuthError;
use crate::jwt::JwtService;

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedHeader)?;

        Ok(Self(token.to_string()))
    }
}

/// Any caller holding a valid token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Account id from the token.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id
    }

    /// Account type from the token.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.0.user_type
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<JwtService>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let jwt = Arc::<JwtService>::from_ref(state);

        let claims = jwt.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            e
        })?;

        Ok(Self(claims))
    }
}

/// Caller must hold a customer token.
#[derive(Debug, Clone)]
pub struct RequireCustomer(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
    Arc<JwtService>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        require(claims, UserRole::Customer).map(Self)
    }
}

/// Caller must hold a worker token.
#[derive(Debug, Clone)]
pub struct RequireWorker(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for RequireWorker
where
    S: Send + Sync,
    Arc<JwtService>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        require(claims, UserRole::Worker).map(Self)
    }
}

fn require(claims: Claims, required: UserRole) -> Result<Claims, AppError> {
    if claims.user_type == required {
        Ok(claims)
    } else {
        tracing::debug!(
            user_id = %claims.user_id,
            role = %claims.user_type,
            required = %required,
            "Role check failed"
        );
        Err(AuthError::Forbidden { required }.into())
    }
}
