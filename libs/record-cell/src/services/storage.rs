use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::models::{FileUpload, RecordError};

pub const PUBLIC_PREFIX: &str = "/uploads";

/// Where record attachments end up. Returns the public URL of the stored file.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, upload: &FileUpload) -> Result<String, RecordError>;
}

/// Decodes the payload, stripping a `data:<type>;base64,` prefix if present.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, RecordError> {
    let encoded = match data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => data,
    };

    BASE64
        .decode(encoded.trim())
        .map_err(|e| RecordError::ValidationError(format!("Invalid file data: {}", e)))
}

fn extension_for(upload: &FileUpload) -> String {
    let from_name = upload
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty());

    let from_type = upload
        .content_type
        .as_deref()
        .and_then(|content_type| content_type.split('/').nth(1))
        .map(|subtype| subtype.split(';').next().unwrap_or(subtype).trim())
        .filter(|ext| !ext.is_empty());

    from_name
        .or(from_type)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
        .to_ascii_lowercase()
}

/// `<millis>-<uuid>.<ext>`; never derived from the client's path.
pub fn generate_file_name(upload: &FileUpload) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        extension_for(upload)
    )
}

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, upload: &FileUpload) -> Result<String, RecordError> {
        let bytes = decode_payload(&upload.data)?;
        let file_name = generate_file_name(upload);
        let path = self.root.join(&file_name);

        debug!("Writing {} bytes to {}", bytes.len(), path.display());

        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            error!("Cannot create upload directory {}: {}", self.root.display(), e);
            RecordError::FileStorage(e.to_string())
        })?;
        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            error!("Cannot write upload {}: {}", path.display(), e);
            RecordError::FileStorage(e.to_string())
        })?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }
}
