use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{LoginAttempt, NewLoginAttempt, NewRefreshToken, NewUser, RefreshTokenRecord, User};

/// Opaque infrastructure failure from a storage collaborator. The transport
/// layer maps these to a generic failure response.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential store: user records by id, username, email, or either.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>>;
    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;
    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;
    /// Assigns the id and both timestamps; the draft carries everything else.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    /// Writes the aggregate back, including its restamped `updated_at`.
    async fn update(&self, user: &User) -> StoreResult<()>;
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// Refresh-token store. `claim` is the rotation primitive: it must flip
/// `revoked` from false to true as one conditional write so that exactly one
/// of any number of concurrent callers wins.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(&self, token: NewRefreshToken) -> StoreResult<RefreshTokenRecord>;
    async fn find_by_digest(&self, digest: &str) -> StoreResult<Option<RefreshTokenRecord>>;
    /// Atomically revoke the live token with this digest. Returns the record
    /// only when this call performed the revocation; `None` means the token
    /// was absent or already revoked.
    async fn claim(&self, digest: &str) -> StoreResult<Option<RefreshTokenRecord>>;
    /// Idempotent: revoking an absent or already-revoked token succeeds.
    async fn revoke_by_digest(&self, digest: &str) -> StoreResult<()>;
    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<()>;
}

/// Append-only login-attempt ledger.
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    async fn record(&self, attempt: NewLoginAttempt) -> StoreResult<LoginAttempt>;
    /// Failed attempts for this raw identifier since `since` (sliding
    /// lockout window). The identifier is not resolved to a user first.
    async fn count_recent_failures(
        &self,
        identifier: &str,
        since: DateTime<FixedOffset>,
    ) -> StoreResult<u64>;
}
