pub mod email;
pub mod login_attempt;
pub mod token;
pub mod user;

pub use email::normalize_email;
pub use login_attempt::{LoginAttempt, NewLoginAttempt};
pub use token::{NewRefreshToken, RefreshTokenRecord};
pub use user::{DomainError, NewUser, PublicUser, User, UserStatus};

pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";
