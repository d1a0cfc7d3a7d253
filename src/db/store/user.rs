use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    db::entities::user::{self, Entity as UserEntity},
    domain::{NewUser, User, UserStatus},
    store::{StoreResult, UserStore},
};

#[derive(Clone)]
pub struct SqlUserStore {
    db: DatabaseConnection,
}

impl SqlUserStore {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }
}

fn to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        roles: serde_json::from_value(model.roles).unwrap_or_default(),
        // Unknown status text loads as Inactive: fail closed.
        status: UserStatus::try_from(model.status.as_str()).unwrap_or(UserStatus::Inactive),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[async_trait]
impl UserStore for SqlUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(to_domain))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>> {
        let model = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier.to_lowercase())),
            )
            .one(&self.db)
            .await?;
        Ok(model.map(to_domain))
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now().fixed_offset();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            roles: Set(serde_json::json!(user.roles)),
            status: Set(user.status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(to_domain(inserted))
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        user::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            roles: Set(serde_json::json!(user.roles)),
            status: Set(user.status.as_str().to_string()),
            updated_at: Set(user.updated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        UserEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
