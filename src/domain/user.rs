use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("User is already {0}")]
    InvalidStateTransition(UserStatus),
    #[error("User already has role: {0}")]
    DuplicateRole(String),
    #[error("User does not have role: {0}")]
    RoleNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Suspended => "SUSPENDED",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            "SUSPENDED" => Ok(UserStatus::Suspended),
            _ => Err(()),
        }
    }
}

/// A user as loaded from storage. Each request works on its own copy and
/// writes it back through the store; there is no shared in-process state.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Draft of a user before persistence. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password_hash: &str, roles: Vec<String>) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            roles,
            status: UserStatus::Active,
        }
    }
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn is_inactive(&self) -> bool {
        self.status == UserStatus::Inactive
    }

    pub fn is_suspended(&self) -> bool {
        self.status == UserStatus::Suspended
    }

    pub fn can_login(&self) -> bool {
        self.is_active()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    pub fn activate(&mut self) -> Result<(), DomainError> {
        self.transition(UserStatus::Active)
    }

    pub fn suspend(&mut self) -> Result<(), DomainError> {
        self.transition(UserStatus::Suspended)
    }

    pub fn deactivate(&mut self) -> Result<(), DomainError> {
        self.transition(UserStatus::Inactive)
    }

    // Transitioning into the current state is an error, not a no-op.
    fn transition(&mut self, target: UserStatus) -> Result<(), DomainError> {
        if self.status == target {
            return Err(DomainError::InvalidStateTransition(target));
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    pub fn add_role(&mut self, role: &str) -> Result<(), DomainError> {
        if self.has_role(role) {
            return Err(DomainError::DuplicateRole(role.to_string()));
        }
        self.roles.push(role.to_string());
        self.touch();
        Ok(())
    }

    pub fn remove_role(&mut self, role: &str) -> Result<(), DomainError> {
        let Some(index) = self.roles.iter().position(|r| r == role) else {
            return Err(DomainError::RoleNotFound(role.to_string()));
        };
        self.roles.remove(index);
        self.touch();
        Ok(())
    }

    pub fn update_password(&mut self, new_password_hash: &str) {
        self.password_hash = new_password_hash.to_string();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().fixed_offset();
    }
}

/// Public-safe projection of a user. The password hash never crosses this
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            status: user.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(status: UserStatus) -> User {
        let now = Utc::now().fixed_offset();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            roles: vec!["user".to_string()],
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_active_users_can_login() {
        assert!(sample_user(UserStatus::Active).can_login());
        assert!(!sample_user(UserStatus::Inactive).can_login());
        assert!(!sample_user(UserStatus::Suspended).can_login());
    }

    #[test]
    fn transitions_between_distinct_states_succeed() {
        let mut user = sample_user(UserStatus::Active);
        user.suspend().expect("active -> suspended");
        assert!(user.is_suspended());
        user.activate().expect("suspended -> active");
        user.deactivate().expect("active -> inactive");
        assert!(user.is_inactive());
    }

    #[test]
    fn transition_into_current_state_fails() {
        let mut user = sample_user(UserStatus::Active);
        assert_eq!(
            user.activate(),
            Err(DomainError::InvalidStateTransition(UserStatus::Active))
        );

        let mut suspended = sample_user(UserStatus::Suspended);
        assert_eq!(
            suspended.suspend(),
            Err(DomainError::InvalidStateTransition(UserStatus::Suspended))
        );
    }

    #[test]
    fn transition_restamps_updated_at() {
        let mut user = sample_user(UserStatus::Active);
        let before = user.updated_at;
        user.suspend().unwrap();
        assert!(user.updated_at >= before);
    }

    #[test]
    fn role_management_rejects_duplicates_and_missing_roles() {
        let mut user = sample_user(UserStatus::Active);
        assert_eq!(
            user.add_role("user"),
            Err(DomainError::DuplicateRole("user".to_string()))
        );
        user.add_role("admin").expect("new role");
        assert!(user.has_role("admin"));

        user.remove_role("admin").expect("present role");
        assert_eq!(
            user.remove_role("admin"),
            Err(DomainError::RoleNotFound("admin".to_string()))
        );
    }

    #[test]
    fn has_any_role_matches_any_member() {
        let user = sample_user(UserStatus::Active);
        assert!(user.has_any_role(&["admin", "user"]));
        assert!(!user.has_any_role(&["admin", "auditor"]));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            UserStatus::Active,
            UserStatus::Inactive,
            UserStatus::Suspended,
        ] {
            assert_eq!(UserStatus::try_from(status.as_str()), Ok(status));
        }
        assert!(UserStatus::try_from("PENDING").is_err());
    }

    #[test]
    fn projection_never_carries_the_password_hash() {
        let user = sample_user(UserStatus::Active);
        let public = PublicUser::from(&user);
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("hash"));
        assert_eq!(public.username, "alice");
        assert_eq!(public.status, UserStatus::Active);
    }
}
