use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use auth_cell::{UserDirectory, UserRepository};
use security_cell::{AccessPolicy, Action, SecurityError};
use shared_database::{from_document, to_document, AppState, DocumentStore, Filter};
use shared_models::auth::{AuthUser, Role};
use shared_utils::dates::parse_datetime;

use crate::models::{MedicalRecord, RecordError, RecordView, UploadRecordRequest};
use crate::services::storage::{decode_payload, FileStorage, LocalFileStorage};

pub const RECORDS_COLLECTION: &str = "records";

pub struct RecordService {
    store: Arc<dyn DocumentStore>,
    users: Arc<dyn UserDirectory>,
    files: Arc<dyn FileStorage>,
    policy: AccessPolicy,
}

impl RecordService {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(
            state.store.clone(),
            Arc::new(UserRepository::new(state.store.clone())),
            Arc::new(LocalFileStorage::new(&state.config.upload_dir)),
        )
    }

    pub fn with_parts(
        store: Arc<dyn DocumentStore>,
        users: Arc<dyn UserDirectory>,
        files: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            store,
            users,
            files,
            policy: AccessPolicy::new(),
        }
    }

    pub async fn upload_record(
        &self,
        user: &AuthUser,
        request: UploadRecordRequest,
    ) -> Result<MedicalRecord, RecordError> {
        self.policy.require_role(user, Action::UploadRecord)?;
        debug!("Doctor {} uploading record", user.id);

        let patient_id = request
            .patient_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RecordError::ValidationError("patientId is required".to_string()))?;
        let patient_id = Uuid::parse_str(patient_id)
            .map_err(|_| RecordError::ValidationError("Invalid patientId format".to_string()))?;

        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RecordError::ValidationError("description is required".to_string()))?
            .to_string();

        let date = match request.date.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_datetime(raw)
                .ok_or_else(|| RecordError::ValidationError("Invalid date format".to_string()))?,
            None => Utc::now(),
        };

        // Reject bad payloads before anything touches storage.
        if let Some(file) = &request.file {
            decode_payload(&file.data)?;
        }

        if self.users.find_with_role(patient_id, Role::Patient).await?.is_none() {
            return Err(RecordError::PatientNotFound);
        }

        let file_url = match &request.file {
            Some(file) => Some(self.files.store(file).await?),
            None => None,
        };

        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: user.id,
            description,
            date,
            file_url,
            created_at: Utc::now(),
        };

        let created = self
            .store
            .insert(RECORDS_COLLECTION, to_document(&record)?)
            .await?;
        let record: MedicalRecord = from_document(created)?;

        info!("Record {} uploaded for patient {} by {}", record.id, patient_id, user.id);
        Ok(record)
    }

    pub async fn list_records(&self, user: &AuthUser) -> Result<Vec<RecordView>, RecordError> {
        self.policy.require_role(user, Action::ListRecords)?;

        let filter = match user.role {
            Role::Doctor => Filter::new().eq("doctor_id", user.id.to_string()),
            Role::Patient => Filter::new().eq("patient_id", user.id.to_string()),
            role => {
                return Err(RecordError::Forbidden(SecurityError::RoleDenied {
                    role,
                    action: Action::ListRecords,
                }))
            }
        };

        let mut records = self
            .store
            .find(RECORDS_COLLECTION, &filter)
            .await?
            .into_iter()
            .map(from_document::<MedicalRecord>)
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by(|a, b| b.date.cmp(&a.date));

        let ids: Vec<Uuid> = records
            .iter()
            .flat_map(|r| [r.patient_id, r.doctor_id])
            .collect();
        let people = self.users.participants(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| RecordView::new(record, &people))
            .collect())
    }
}
