use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use auth_cell::Participant;
use security_cell::SecurityError;
use shared_database::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub description: String,
    pub date: DateTime<Utc>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub patient: Option<Participant>,
    pub doctor: Option<Participant>,
}

impl RecordView {
    pub fn new(record: MedicalRecord, people: &HashMap<Uuid, Participant>) -> Self {
        Self {
            patient: people.get(&record.patient_id).cloned(),
            doctor: people.get(&record.doctor_id).cloned(),
            record,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecordRequest {
    pub patient_id: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub file: Option<FileUpload>,
}

/// Attachment carried inline as base64, optionally as a `data:` URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: String,
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Patient not found")]
    PatientNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Failed to store file: {0}")]
    FileStorage(String),

    #[error(transparent)]
    Forbidden(#[from] SecurityError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
}
