/**
 * Token Validation
 *
 * The `AuthAuthority` trait resolves a bearer credential to a user id.
 * `JwtAuthority` is the shipped implementation: HS256 tokens whose `sub`
 * claim carries the numeric user id issued by the user service.
 */

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::models::UserId;

/// Token lifetime for tokens minted by `issue_token`
const TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("invalid subject in token: {0}")]
    InvalidSubject(String),
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// Resolves a bearer credential to the user it belongs to
#[async_trait]
pub trait AuthAuthority: Send + Sync {
    async fn validate_token(&self, token: &str) -> Result<UserId, AuthError>;
}

/// HS256 token authority sharing a secret with the user service
pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthority {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Create a token for a user
    ///
    /// # Arguments
    /// * `user_id` - User the token authenticates
    ///
    /// # Returns
    /// Signed JWT valid for thirty days
    pub fn issue_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + TOKEN_TTL_SECS) as u64,
            iat: now as u64,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify and decode a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl AuthAuthority for JwtAuthority {
    async fn validate_token(&self, token: &str) -> Result<UserId, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let claims = self.verify_token(token)?;
        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))
    }
}
