//! Bearer-token authentication
//!
//! Tokens are issued by the account service; the gateway only verifies them.
//! Provides:
//! - JWT generation and validation
//! - `AuthUser` (required) and `MaybeUser` (optional) extractors

use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: i64::try_from(expiration_secs).unwrap_or(i64::MAX / 2),
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    /// Validate a token and return the user it was issued to
    pub fn user_id(&self, token: &str) -> Result<Uuid> {
        let claims = self.validate_token(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticated caller. Rejects the request when no valid token is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Optionally authenticated caller.
///
/// A missing header yields `MaybeUser(None)`. A header carrying a bad or
/// expired token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeUser(pub Option<Uuid>);

fn user_from_parts(parts: &Parts, jwt: &JwtManager) -> Result<Option<Uuid>> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(extract_bearer)
        .ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must be a bearer token".to_string(),
        })?;

    jwt.user_id(token).map(Some)
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let jwt = Arc::<JwtManager>::from_ref(state);
        user_from_parts(parts, &jwt)?
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let jwt = Arc::<JwtManager>::from_ref(state);
        user_from_parts(parts, &jwt).map(MaybeUser)
    }
}
