//! Fixtures for cells whose tests need real users in the store.
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{AuthUser, Role};

use crate::models::User;
use crate::services::{UserDirectory, UserRepository};

pub fn build_user(role: Role, name: &str) -> User {
    let id = Uuid::new_v4();
    let handle = format!("{}-{}", role, &id.simple().to_string()[..8]);

    User {
        id,
        username: handle.clone(),
        email: format!("{}@hospital.test", handle),
        name: name.to_string(),
        password_hash: String::new(),
        role,
        phone: String::new(),
        address: String::new(),
        specialty: (role == Role::Doctor).then(|| "General Practice".to_string()),
        license_number: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Inserts an active user with `role` and returns the identity a verified
/// token for it would carry.
pub async fn seed_user(state: &AppState, role: Role) -> AuthUser {
    let user = seed_named_user(state, role, &format!("Test {}", role)).await;
    AuthUser::new(user.id, user.role)
}

pub async fn seed_named_user(state: &AppState, role: Role, name: &str) -> User {
    let users = UserRepository::new(Arc::clone(&state.store));
    users
        .insert_user(build_user(role, name))
        .await
        .expect("seed user insert")
}
