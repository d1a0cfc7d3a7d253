pub mod login_attempt;
pub mod refresh_token;
pub mod user;

pub use login_attempt::SqlLoginAttemptStore;
pub use refresh_token::SqlRefreshTokenStore;
pub use user::SqlUserStore;
