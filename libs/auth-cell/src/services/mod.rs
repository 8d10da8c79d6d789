pub mod auth;
pub mod directory;

pub use auth::AuthService;
pub use directory::{UserDirectory, UserRepository, USERS_COLLECTION};
