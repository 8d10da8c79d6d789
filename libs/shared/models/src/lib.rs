pub mod auth;
pub mod error;

pub use auth::{AuthUser, JwtClaims, Role};
pub use error::AppError;
