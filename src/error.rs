use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{domain::DomainError, store::StoreError};

pub const LOCKOUT_WINDOW_MINUTES: i64 = 15;

/// Failure taxonomy of the authentication core.
///
/// Credential-correctness failures (unknown identifier, bad password) share
/// the single `InvalidCredentials` variant so callers cannot probe which
/// accounts exist. Account-status failures are distinct on purpose so the
/// client can render the right guidance.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("{0}")]
    WeakPassword(&'static str),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error(
        "Too many failed login attempts. Please try again in {LOCKOUT_WINDOW_MINUTES} minutes."
    )]
    TooManyAttempts,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Your account has been suspended. Please contact support.")]
    AccountSuspended,
    #[error("Your account is inactive. Please contact an administrator.")]
    AccountInactive,
    #[error("User account is not active")]
    AccountNotActive,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token has expired")]
    RefreshTokenExpired,
    #[error("Refresh token reuse detected")]
    RefreshTokenReuseDetected,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("storage error")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail | Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
            Self::TooManyAttempts
            | Self::InvalidCredentials
            | Self::AccountSuspended
            | Self::AccountInactive
            | Self::AccountNotActive
            | Self::InvalidRefreshToken
            | Self::RefreshTokenExpired
            | Self::RefreshTokenReuseDetected
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Domain(err) => match err {
                DomainError::RoleNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::CONFLICT,
            },
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self:?}");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_external_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }

    #[test]
    fn lockout_message_names_the_window() {
        assert!(AuthError::TooManyAttempts.to_string().contains("15 minutes"));
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AuthError::InvalidEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::EmailTaken.status(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::RefreshTokenReuseDetected.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::UserNotFound.status(), StatusCode::NOT_FOUND);
    }
}
