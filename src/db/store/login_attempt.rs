use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::{
    db::entities::login_attempt::{self, Entity as LoginAttemptEntity},
    domain::{LoginAttempt, NewLoginAttempt},
    store::{LoginAttemptStore, StoreResult},
};

#[derive(Clone)]
pub struct SqlLoginAttemptStore {
    db: DatabaseConnection,
}

impl SqlLoginAttemptStore {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }
}

fn to_domain(model: login_attempt::Model) -> LoginAttempt {
    LoginAttempt {
        id: model.id,
        user_id: model.user_id,
        identifier: model.identifier,
        success: model.success,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        reason: model.reason,
        created_at: model.created_at,
    }
}

#[async_trait]
impl LoginAttemptStore for SqlLoginAttemptStore {
    async fn record(&self, attempt: NewLoginAttempt) -> StoreResult<LoginAttempt> {
        let model = login_attempt::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(attempt.user_id),
            identifier: Set(attempt.identifier),
            success: Set(attempt.success),
            ip_address: Set(attempt.ip_address),
            user_agent: Set(attempt.user_agent),
            reason: Set(attempt.reason),
            created_at: Set(Utc::now().fixed_offset()),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(to_domain(inserted))
    }

    async fn count_recent_failures(
        &self,
        identifier: &str,
        since: DateTime<FixedOffset>,
    ) -> StoreResult<u64> {
        let count = LoginAttemptEntity::find()
            .filter(login_attempt::Column::Identifier.eq(identifier))
            .filter(login_attempt::Column::Success.eq(false))
            .filter(login_attempt::Column::CreatedAt.gte(since))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
