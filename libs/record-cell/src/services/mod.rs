pub mod record;
pub mod storage;

pub use record::RecordService;
pub use storage::{FileStorage, LocalFileStorage};
