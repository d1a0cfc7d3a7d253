use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    db::store::{SqlLoginAttemptStore, SqlRefreshTokenStore, SqlUserStore},
    services::{AuthService, TokenService, UserService},
    store::{LoginAttemptStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
    pub tokens: TokenService,
}

impl AppState {
    /// Wire the services over arbitrary store implementations. Tests hand
    /// in the in-memory stores; `from_db` hands in the SQL ones.
    pub fn new(
        users: Arc<dyn UserStore>,
        attempts: Arc<dyn LoginAttemptStore>,
        tokens: TokenService,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth: AuthService::new(Arc::clone(&users), attempts, tokens.clone()),
            users: UserService::new(users, tokens.clone()),
            tokens,
        })
    }

    pub fn from_db(cfg: &AppConfig, db: DatabaseConnection) -> Arc<Self> {
        let tokens = TokenService::new(
            Arc::new(SqlRefreshTokenStore::new(&db)),
            cfg.access_token_secret.as_bytes(),
            cfg.refresh_token_secret.as_bytes(),
        )
        .with_ttls(cfg.access_token_ttl_secs, cfg.refresh_token_ttl_days);

        Self::new(
            Arc::new(SqlUserStore::new(&db)),
            Arc::new(SqlLoginAttemptStore::new(&db)),
            tokens,
        )
    }
}
