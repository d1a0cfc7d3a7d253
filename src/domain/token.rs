use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// Persisted refresh token. Only a one-way digest of the signed token is
/// stored; `revoked` is monotonic, it never flips back to false.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<FixedOffset>,
    pub revoked: bool,
    pub created_at: DateTime<FixedOffset>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl RefreshTokenRecord {
    pub fn is_usable(&self, now: DateTime<FixedOffset>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_digest: String,
    pub expires_at: DateTime<FixedOffset>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
