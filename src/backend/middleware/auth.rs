/**
 * Authentication Middleware
 *
 * Protects the REST routes. The bearer token from the `Authorization`
 * header is validated by the configured `AuthAuthority`, and the resolved
 * user is attached to the request extensions for handlers to pick up with
 * the `AuthUser` extractor.
 */

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::sessions::AuthAuthority;
use crate::backend::error::BackendError;
use crate::shared::models::UserId;

/// Authenticated user resolved from the bearer token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Returns 401 when the header is missing or the token does not validate.
pub async fn auth_middleware(
    State(authority): State<Arc<dyn AuthAuthority>>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("[Auth] missing or malformed Authorization header");
        BackendError::unauthorized("missing token")
    })?;

    let user_id = authority.validate_token(token).await.map_err(|e| {
        tracing::warn!("[Auth] invalid token: {}", e);
        BackendError::unauthorized("invalid token")
    })?;

    request.extensions_mut().insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

/// Axum extractor for the user set by `auth_middleware`
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.0.user_id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("missing token")
            })
    }
}
