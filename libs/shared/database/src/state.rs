use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};

use crate::memory::MemoryStore;
use crate::store::DocumentStore;
use crate::supabase::SupabaseClient;

/// Shared router state: configuration plus the document store every cell
/// builds its repositories on.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store: Arc<dyn DocumentStore> = match config.storage_backend() {
            StorageBackend::Supabase => {
                info!("Using Supabase storage at {}", config.supabase_url);
                Arc::new(SupabaseClient::new(&config))
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
        };

        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(MemoryStore::new()),
        }
    }
}
