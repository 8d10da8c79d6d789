pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{MedicalRecord, RecordError};
pub use router::record_routes;
pub use services::{FileStorage, LocalFileStorage, RecordService};
