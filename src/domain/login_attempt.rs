use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// Append-only audit record of a login attempt. Never mutated or deleted by
/// this core; retention is an operational concern.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginAttempt {
    pub id: Uuid,
    /// Absent when the submitted identifier did not resolve to a user.
    pub user_id: Option<Uuid>,
    /// The identifier exactly as submitted; lockout counting keys on this.
    pub identifier: String,
    pub success: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct NewLoginAttempt {
    pub user_id: Option<Uuid>,
    pub identifier: String,
    pub success: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub reason: Option<String>,
}

impl NewLoginAttempt {
    pub fn failure(identifier: &str, reason: &str) -> Self {
        Self {
            user_id: None,
            identifier: identifier.to_string(),
            success: false,
            ip_address: None,
            user_agent: None,
            reason: Some(reason.to_string()),
        }
    }

    pub fn success(identifier: &str, user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            identifier: identifier.to_string(),
            success: true,
            ip_address: None,
            user_agent: None,
            reason: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_client(mut self, ip: Option<&str>, user_agent: Option<&str>) -> Self {
        self.ip_address = ip.map(str::to_string);
        self.user_agent = user_agent.map(str::to_string);
        self
    }
}
