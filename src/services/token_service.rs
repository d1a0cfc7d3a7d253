use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    auth::{
        AccessClaims, RefreshClaims,
        jwt::{self, JwtKeys},
    },
    domain::{NewRefreshToken, RefreshTokenRecord, User},
    error::AuthError,
    store::RefreshTokenStore,
};

pub const DEFAULT_ACCESS_TTL_SECS: usize = 15 * 60; // 15 minutes
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Client metadata attached to persisted refresh tokens.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Outcome of a successful rotation claim: the subject whose token was
/// consumed. The caller decides whether a new pair may be minted.
#[derive(Debug, Clone, Copy)]
pub struct RotatedToken {
    pub user_id: Uuid,
}

/// Issues, verifies, persists, rotates and revokes tokens.
///
/// Access and refresh tokens are signed with independent key material, so
/// compromise of one secret does not compromise the other. Refresh tokens
/// are stored as SHA-256 digests: a storage leak yields nothing directly
/// usable.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn RefreshTokenStore>,
    access: JwtKeys,
    refresh: JwtKeys,
    access_ttl_secs: usize,
    refresh_ttl_days: i64,
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl TokenService {
    pub fn new(
        store: Arc<dyn RefreshTokenStore>,
        access_secret: &[u8],
        refresh_secret: &[u8],
    ) -> Self {
        Self {
            store,
            access: JwtKeys::from_secret(access_secret),
            refresh: JwtKeys::from_secret(refresh_secret),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
        }
    }

    pub fn with_ttls(mut self, access_ttl_secs: usize, refresh_ttl_days: i64) -> Self {
        self.access_ttl_secs = access_ttl_secs;
        self.refresh_ttl_days = refresh_ttl_days;
        self
    }

    pub fn access_ttl_secs(&self) -> usize {
        self.access_ttl_secs
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let iat = jwt::now_unix();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            roles: user.roles.clone(),
            iat,
            exp: iat + self.access_ttl_secs,
        };
        jwt::encode_claims(&self.access, &claims)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jwt::decode_access(&self.access, token)
    }

    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let iat = jwt::now_unix();
        let exp = (iat as i64 + self.refresh_ttl_days * 86_400).max(0) as usize;
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat,
            exp,
        };
        jwt::encode_claims(&self.refresh, &claims)
    }

    pub async fn save_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<FixedOffset>,
        client: &ClientMeta,
    ) -> Result<RefreshTokenRecord, AuthError> {
        let record = self
            .store
            .create(NewRefreshToken {
                user_id,
                token_digest: digest(token),
                expires_at,
                user_agent: client.user_agent.clone(),
                ip_address: client.ip_address.clone(),
            })
            .await?;
        Ok(record)
    }

    pub async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self.store.find_by_digest(&digest(token)).await?)
    }

    /// A token absent from storage counts as revoked: fail closed.
    pub async fn is_token_revoked(&self, token: &str) -> Result<bool, AuthError> {
        match self.find_refresh_token(token).await? {
            Some(record) => Ok(record.revoked),
            None => Ok(true),
        }
    }

    /// Idempotent: revoking an unknown or already-revoked token succeeds.
    pub async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthError> {
        Ok(self.store.revoke_by_digest(&digest(token)).await?)
    }

    pub async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<(), AuthError> {
        Ok(self.store.revoke_all_for_user(user_id).await?)
    }

    /// Mint and persist an access+refresh pair for `user`. One clock read
    /// drives both expiries and the stored record.
    pub async fn issue_pair(
        &self,
        user: &User,
        client: &ClientMeta,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now().fixed_offset();
        let access_token = self.generate_access_token(user)?;
        let refresh_token = self.generate_refresh_token(user.id)?;
        let expires_at = now + Duration::days(self.refresh_ttl_days);
        self.save_refresh_token(user.id, &refresh_token, expires_at, client)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Consume `old_token` for rotation. A refresh token rotates at most
    /// once: the store's conditional claim decides the winner under
    /// concurrency, and a losing or replayed presentation is treated as
    /// reuse, revoking every token of the claimed subject.
    pub async fn rotate(&self, old_token: &str) -> Result<RotatedToken, AuthError> {
        let claims = jwt::decode_refresh(&self.refresh, old_token)?;
        let now = Utc::now().fixed_offset();

        match self.store.claim(&digest(old_token)).await? {
            Some(record) => {
                if now >= record.expires_at {
                    // The claim above already revoked the expired token.
                    return Err(AuthError::RefreshTokenExpired);
                }
                Ok(RotatedToken {
                    user_id: record.user_id,
                })
            }
            None => {
                tracing::warn!(subject = %claims.sub, "refresh token reuse detected");
                if let Ok(user_id) = Uuid::parse_str(&claims.sub) {
                    if let Err(err) = self.store.revoke_all_for_user(user_id).await {
                        tracing::error!("failed to revoke tokens after reuse: {err}");
                    }
                }
                Err(AuthError::RefreshTokenReuseDetected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        domain::{UserStatus, user::User},
        test_helpers::MemoryRefreshTokenStore,
    };

    fn service() -> TokenService {
        TokenService::new(
            Arc::new(MemoryRefreshTokenStore::default()),
            b"unit-test-access-secret-32bytes!",
            b"unit-test-refresh-secret-32bytes",
        )
    }

    fn user() -> User {
        let now = Utc::now().fixed_offset();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            roles: vec!["user".to_string()],
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_round_trips_through_verify() {
        let service = service();
        let user = user();
        let token = service.generate_access_token(&user).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.roles, vec!["user".to_string()]);
        assert_eq!(claims.exp - claims.iat, DEFAULT_ACCESS_TTL_SECS);
    }

    #[test]
    fn refresh_tokens_are_unique_per_mint() {
        let service = service();
        let user_id = Uuid::new_v4();
        let a = service.generate_refresh_token(user_id).unwrap();
        let b = service.generate_refresh_token(user_id).unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn unknown_token_counts_as_revoked() {
        let service = service();
        assert!(service.is_token_revoked("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn revocation_is_idempotent() {
        let service = service();
        let user = user();
        let pair = service.issue_pair(&user, &ClientMeta::default()).await.unwrap();

        service.revoke_refresh_token(&pair.refresh_token).await.unwrap();
        service.revoke_refresh_token(&pair.refresh_token).await.unwrap();
        service.revoke_refresh_token("garbage").await.unwrap();

        assert!(service.is_token_revoked(&pair.refresh_token).await.unwrap());
    }

    #[tokio::test]
    async fn issued_pair_is_persisted_live() {
        let service = service();
        let user = user();
        let pair = service.issue_pair(&user, &ClientMeta::default()).await.unwrap();

        let record = service
            .find_refresh_token(&pair.refresh_token)
            .await
            .unwrap()
            .expect("record persisted");
        assert_eq!(record.user_id, user.id);
        assert!(!record.revoked);
        // only the digest is stored
        assert_ne!(record.token_digest, pair.refresh_token);
    }
}
