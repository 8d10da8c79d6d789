pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
#[cfg(feature = "test-support")]
pub mod test_support;

pub use models::{AuthError, Participant, User, UserProfile};
pub use router::auth_routes;
pub use services::{AuthService, UserDirectory, UserRepository};
