use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    auth::{AccessClaims, password},
    domain::{self, NewLoginAttempt, NewUser, PublicUser, normalize_email},
    error::{AuthError, LOCKOUT_WINDOW_MINUTES},
    services::token_service::{ClientMeta, TokenPair, TokenService},
    store::{LoginAttemptStore, UserStore},
};

const MAX_FAILED_ATTEMPTS: u64 = 5;

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

/// Composes the credential store, password hasher, login-attempt ledger and
/// token service into the register/login/refresh/logout protocols.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    attempts: Arc<dyn LoginAttemptStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        attempts: Arc<dyn LoginAttemptStore>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            attempts,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        plain_password: &str,
    ) -> Result<PublicUser, AuthError> {
        let email = normalize_email(email)?;
        password::validate_password(plain_password)?;

        if self.users.exists_by_username(username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = password::hash_password(plain_password)?;
        let user = self
            .users
            .create(NewUser::new(
                username,
                &email,
                &password_hash,
                vec![domain::DEFAULT_ROLE.to_string()],
            ))
            .await?;

        Ok(PublicUser::from(&user))
    }

    pub async fn login(
        &self,
        identifier: &str,
        plain_password: &str,
        client: &ClientMeta,
    ) -> Result<LoginOutcome, AuthError> {
        let now = Utc::now().fixed_offset();
        let since = now - Duration::minutes(LOCKOUT_WINDOW_MINUTES);

        // Lockout counts by the raw identifier, before any user lookup, so
        // hammering an unknown name locks just the same.
        let failures = self.attempts.count_recent_failures(identifier, since).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            self.record_attempt(
                NewLoginAttempt::failure(
                    identifier,
                    "Account temporarily locked due to too many failed attempts",
                )
                .with_client(client.ip_address.as_deref(), client.user_agent.as_deref()),
            )
            .await;
            return Err(AuthError::TooManyAttempts);
        }

        let Some(user) = self.users.find_by_username_or_email(identifier).await? else {
            self.record_attempt(
                NewLoginAttempt::failure(identifier, "User not found")
                    .with_client(client.ip_address.as_deref(), client.user_agent.as_deref()),
            )
            .await;
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(plain_password, &user.password_hash) {
            self.record_attempt(
                NewLoginAttempt::failure(identifier, "Invalid password")
                    .with_user(user.id)
                    .with_client(client.ip_address.as_deref(), client.user_agent.as_deref()),
            )
            .await;
            return Err(AuthError::InvalidCredentials);
        }

        if !user.can_login() {
            self.record_attempt(
                NewLoginAttempt::failure(identifier, &format!("Account status: {}", user.status))
                    .with_user(user.id)
                    .with_client(client.ip_address.as_deref(), client.user_agent.as_deref()),
            )
            .await;
            return Err(if user.is_suspended() {
                AuthError::AccountSuspended
            } else if user.is_inactive() {
                AuthError::AccountInactive
            } else {
                AuthError::AccountNotActive
            });
        }

        let tokens = self.tokens.issue_pair(&user, client).await?;

        self.record_attempt(
            NewLoginAttempt::success(identifier, user.id)
                .with_client(client.ip_address.as_deref(), client.user_agent.as_deref()),
        )
        .await;

        Ok(LoginOutcome {
            tokens,
            user: PublicUser::from(&user),
        })
    }

    /// Rotate a refresh token into a new pair. The status re-check runs
    /// after the claim and before any minting, so a suspended or
    /// deactivated account loses the presented token and gains nothing.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let rotated = self.tokens.rotate(refresh_token).await?;

        let Some(user) = self.users.find_by_id(rotated.user_id).await? else {
            return Err(AuthError::InvalidRefreshToken);
        };
        if !user.can_login() {
            return Err(AuthError::AccountNotActive);
        }

        self.tokens.issue_pair(&user, &ClientMeta::default()).await
    }

    /// Logout never fails observably: revocation is attempted and any
    /// failure is logged and dropped. Disposal of the client-side copy is
    /// what matters.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token.filter(|t| !t.is_empty()) else {
            return;
        };
        if let Err(err) = self.tokens.revoke_refresh_token(token).await {
            tracing::debug!("logout revocation failed: {err}");
        }
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.tokens.verify_access_token(token)
    }

    // Ledger writes are best-effort: a storage failure here must never
    // change the authentication outcome.
    async fn record_attempt(&self, attempt: NewLoginAttempt) {
        if let Err(err) = self.attempts.record(attempt).await {
            tracing::warn!("failed to record login attempt: {err}");
        }
    }
}
