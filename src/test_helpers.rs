//! In-memory store implementations and wiring helpers for tests.
//!
//! The refresh-token store implements the rotation claim as a
//! compare-and-swap under a mutex, the in-process equivalent of the SQL
//! store's conditional `UPDATE ... WHERE revoked = false`.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::{
    domain::{LoginAttempt, NewLoginAttempt, NewRefreshToken, NewUser, RefreshTokenRecord, User},
    services::{AuthService, TokenService, UserService},
    state::AppState,
    store::{LoginAttemptStore, RefreshTokenStore, StoreResult, UserStore},
};

pub const TEST_ACCESS_SECRET: &[u8] = b"test-access-secret-32-bytes-long";
pub const TEST_REFRESH_SECRET: &[u8] = b"test-refresh-secret-32-bytes-lng";

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    /// Number of credential resolutions; the lockout tests assert this
    /// stays at zero while an identifier is locked out.
    pub credential_lookups: AtomicUsize,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>> {
        self.credential_lookups.fetch_add(1, Ordering::SeqCst);
        let email = identifier.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == identifier || u.email == email)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now().fixed_offset();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
            status: user.status,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    records: Mutex<Vec<RefreshTokenRecord>>,
}

impl MemoryRefreshTokenStore {
    pub fn records_for_user(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn create(&self, token: NewRefreshToken) -> StoreResult<RefreshTokenRecord> {
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            token_digest: token.token_digest,
            expires_at: token.expires_at,
            revoked: false,
            created_at: Utc::now().fixed_offset(),
            user_agent: token.user_agent,
            ip_address: token.ip_address,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find_by_digest(&self, digest: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.token_digest == digest)
            .cloned())
    }

    async fn claim(&self, digest: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        // Compare-and-swap on the revoked flag: the whole check-and-flip
        // happens under one lock acquisition.
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.token_digest == digest && !r.revoked)
        {
            Some(record) => {
                record.revoked = true;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn revoke_by_digest(&self, digest: &str) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        for record in records.iter_mut().filter(|r| r.token_digest == digest) {
            record.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        for record in records.iter_mut().filter(|r| r.user_id == user_id) {
            record.revoked = true;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLoginAttemptStore {
    attempts: Mutex<Vec<LoginAttempt>>,
}

impl MemoryLoginAttemptStore {
    pub fn all(&self) -> Vec<LoginAttempt> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LoginAttemptStore for MemoryLoginAttemptStore {
    async fn record(&self, attempt: NewLoginAttempt) -> StoreResult<LoginAttempt> {
        let attempt = LoginAttempt {
            id: Uuid::new_v4(),
            user_id: attempt.user_id,
            identifier: attempt.identifier,
            success: attempt.success,
            ip_address: attempt.ip_address,
            user_agent: attempt.user_agent,
            reason: attempt.reason,
            created_at: Utc::now().fixed_offset(),
        };
        self.attempts.lock().unwrap().push(attempt.clone());
        Ok(attempt)
    }

    async fn count_recent_failures(
        &self,
        identifier: &str,
        since: DateTime<FixedOffset>,
    ) -> StoreResult<u64> {
        Ok(self
            .attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.identifier == identifier && !a.success && a.created_at >= since)
            .count() as u64)
    }
}

/// The three in-memory stores plus handles for white-box assertions.
pub struct TestBackend {
    pub users: Arc<MemoryUserStore>,
    pub refresh_tokens: Arc<MemoryRefreshTokenStore>,
    pub attempts: Arc<MemoryLoginAttemptStore>,
}

impl Default for TestBackend {
    fn default() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::default()),
            refresh_tokens: Arc::new(MemoryRefreshTokenStore::default()),
            attempts: Arc::new(MemoryLoginAttemptStore::default()),
        }
    }
}

impl TestBackend {
    pub fn token_service(&self) -> TokenService {
        TokenService::new(
            Arc::clone(&self.refresh_tokens) as Arc<dyn RefreshTokenStore>,
            TEST_ACCESS_SECRET,
            TEST_REFRESH_SECRET,
        )
    }

    pub fn auth_service(&self) -> AuthService {
        self.auth_service_with(self.token_service())
    }

    pub fn auth_service_with(&self, tokens: TokenService) -> AuthService {
        AuthService::new(
            Arc::clone(&self.users) as Arc<dyn UserStore>,
            Arc::clone(&self.attempts) as Arc<dyn LoginAttemptStore>,
            tokens,
        )
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            Arc::clone(&self.users) as Arc<dyn UserStore>,
            self.token_service(),
        )
    }

    pub fn state(&self) -> Arc<AppState> {
        AppState::new(
            Arc::clone(&self.users) as Arc<dyn UserStore>,
            Arc::clone(&self.attempts) as Arc<dyn LoginAttemptStore>,
            self.token_service(),
        )
    }
}
