use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    db::entities::refresh_token::{self, Entity as RefreshTokenEntity},
    domain::{NewRefreshToken, RefreshTokenRecord},
    store::{RefreshTokenStore, StoreResult},
};

#[derive(Clone)]
pub struct SqlRefreshTokenStore {
    db: DatabaseConnection,
}

impl SqlRefreshTokenStore {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }
}

fn to_domain(model: refresh_token::Model) -> RefreshTokenRecord {
    RefreshTokenRecord {
        id: model.id,
        user_id: model.user_id,
        token_digest: model.token_digest,
        expires_at: model.expires_at,
        revoked: model.revoked,
        created_at: model.created_at,
        user_agent: model.user_agent,
        ip_address: model.ip_address,
    }
}

#[async_trait]
impl RefreshTokenStore for SqlRefreshTokenStore {
    async fn create(&self, token: NewRefreshToken) -> StoreResult<RefreshTokenRecord> {
        let model = refresh_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            token_digest: Set(token.token_digest),
            user_id: Set(token.user_id),
            expires_at: Set(token.expires_at),
            revoked: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
            user_agent: Set(token.user_agent),
            ip_address: Set(token.ip_address),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(to_domain(inserted))
    }

    async fn find_by_digest(&self, digest: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let model = RefreshTokenEntity::find()
            .filter(refresh_token::Column::TokenDigest.eq(digest))
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    async fn claim(&self, digest: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        // Single conditional update: the `revoked = false` guard means at
        // most one concurrent caller observes rows_affected == 1.
        let result = RefreshTokenEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::TokenDigest.eq(digest))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_digest(digest).await
    }

    async fn revoke_by_digest(&self, digest: &str) -> StoreResult<()> {
        RefreshTokenEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::TokenDigest.eq(digest))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> StoreResult<()> {
        RefreshTokenEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
