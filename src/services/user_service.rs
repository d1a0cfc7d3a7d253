use std::sync::Arc;

use uuid::Uuid;

use crate::{
    domain::{PublicUser, User, UserStatus},
    error::AuthError,
    services::token_service::TokenService,
    store::UserStore,
};

/// Administrative user management: status changes, role membership,
/// deletion. Every mutation loads a fresh copy of the aggregate and writes
/// it back whole.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// Transition a user's status. Leaving the ACTIVE state revokes every
    /// outstanding refresh token; re-activation has no token side effect.
    pub async fn change_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<PublicUser, AuthError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        match status {
            UserStatus::Active => user.activate()?,
            UserStatus::Inactive => {
                user.deactivate()?;
                self.tokens.revoke_all_user_tokens(user_id).await?;
            }
            UserStatus::Suspended => {
                user.suspend()?;
                self.tokens.revoke_all_user_tokens(user_id).await?;
            }
        }

        self.users.update(&user).await?;
        Ok(PublicUser::from(&user))
    }

    /// Delete a user. Revocation runs first and is best-effort; the row
    /// delete cascades over whatever revocation could not reach.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        if let Err(err) = self.tokens.revoke_all_user_tokens(user_id).await {
            tracing::warn!(%user_id, "token revocation during delete failed: {err}");
        }

        self.users.delete(user_id).await?;
        Ok(())
    }

    pub async fn add_role(&self, user_id: Uuid, role: &str) -> Result<PublicUser, AuthError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        user.add_role(role)?;
        self.users.update(&user).await?;
        Ok(PublicUser::from(&user))
    }

    pub async fn remove_role(&self, user_id: Uuid, role: &str) -> Result<PublicUser, AuthError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        user.remove_role(role)?;
        self.users.update(&user).await?;
        Ok(PublicUser::from(&user))
    }
}
