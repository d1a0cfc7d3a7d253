pub mod jwt;
pub mod middleware;
pub mod password;

use axum::{extract::FromRequestParts, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Claims of a short-lived access token. Verified statelessly; no
/// persistence or revocation list backs these.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    pub sub: String, // user id
    pub username: String,
    pub roles: Vec<String>,
    pub exp: usize, // expiry (unix)
    pub iat: usize, // issued at
}

/// Claims of a refresh token. `jti` makes every mint distinct even within
/// the same second; the persisted record, not these claims, decides expiry.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String, // user id
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

// Helper extractor: pull verified claims from request extensions.
impl<S> FromRequestParts<S> for AccessClaims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessClaims>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "No claims in request"))
    }
}
