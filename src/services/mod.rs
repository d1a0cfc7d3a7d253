pub mod auth_service;
pub mod token_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use token_service::{ClientMeta, TokenPair, TokenService};
pub use user_service::UserService;
