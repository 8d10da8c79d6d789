pub mod memory;
pub mod state;
pub mod store;
pub mod supabase;

pub use memory::MemoryStore;
pub use state::AppState;
pub use store::{from_document, to_document, DocumentStore, Filter, StoreError};
pub use supabase::SupabaseClient;
