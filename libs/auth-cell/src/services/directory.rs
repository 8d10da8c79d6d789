use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use shared_database::{from_document, to_document, DocumentStore, Filter, StoreError};
use shared_models::auth::Role;

use crate::models::{Participant, User};

pub const USERS_COLLECTION: &str = "users";

/// Identity lookups shared by every cell that references users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Stores `user`, failing with `StoreError::Conflict` when the username
    /// or email is already taken.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;

    /// Looks up each distinct id once. Ids with no stored user are left out.
    async fn participants(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Participant>, StoreError> {
        let distinct: BTreeSet<Uuid> = ids.iter().copied().collect();
        let mut resolved = HashMap::with_capacity(distinct.len());

        for id in distinct {
            if let Some(user) = self.find_user(id).await? {
                resolved.insert(id, Participant::from(&user));
            }
        }
        Ok(resolved)
    }

    /// Resolves `id` to an active user holding `role`.
    async fn find_with_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        Ok(self
            .find_user(id)
            .await?
            .filter(|user| user.role == role && user.is_active))
    }
}

pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn find_first(&self, filter: Filter) -> Result<Option<User>, StoreError> {
        self.store
            .find_one(USERS_COLLECTION, &filter)
            .await?
            .map(from_document::<User>)
            .transpose()
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        debug!("Looking up user {}", id);
        self.find_first(Filter::by_id(id)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_first(Filter::new().eq("username", username)).await
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let unique_on = [
            Filter::new().eq("username", user.username.as_str()),
            Filter::new().eq("email", user.email.as_str()),
        ];
        let created = self
            .store
            .insert_unique(USERS_COLLECTION, to_document(&user)?, &unique_on)
            .await?;
        from_document(created)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let filter = Filter::new()
            .eq("role", role.as_str())
            .eq("is_active", true);

        self.store
            .find(USERS_COLLECTION, &filter)
            .await?
            .into_iter()
            .map(from_document::<User>)
            .collect()
    }
}
