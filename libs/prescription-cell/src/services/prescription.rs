use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use auth_cell::{UserDirectory, UserRepository};
use security_cell::{AccessPolicy, Action, Ownership};
use shared_database::{from_document, to_document, AppState, DocumentStore, Filter};
use shared_models::auth::{AuthUser, Role};

use crate::models::{
    CreatePrescriptionRequest, Medication, MedicationInput, Prescription, PrescriptionError,
    PrescriptionStatus, PrescriptionView,
};

pub const PRESCRIPTIONS_COLLECTION: &str = "prescriptions";

fn parse_id(raw: &str, what: &str) -> Result<Uuid, PrescriptionError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| PrescriptionError::ValidationError(format!("Invalid {} format", what)))
}

fn required(value: Option<&str>, field: &str, index: usize) -> Result<String, PrescriptionError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            PrescriptionError::ValidationError(format!("medications[{}].{} is required", index, field))
        })
}

fn validate_medications(inputs: &[MedicationInput]) -> Result<Vec<Medication>, PrescriptionError> {
    if inputs.is_empty() {
        return Err(PrescriptionError::ValidationError(
            "At least one medication is required".to_string(),
        ));
    }

    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            Ok(Medication {
                medicine: required(input.medicine.as_deref(), "medicine", i)?,
                dosage: required(input.dosage.as_deref(), "dosage", i)?,
                frequency: required(input.frequency.as_deref(), "frequency", i)?,
                duration: required(input.duration.as_deref(), "duration", i)?,
            })
        })
        .collect()
}

fn newest_first(mut prescriptions: Vec<Prescription>) -> Vec<Prescription> {
    prescriptions.sort_by(|a, b| b.date_prescribed.cmp(&a.date_prescribed));
    prescriptions
}

pub struct PrescriptionService {
    store: Arc<dyn DocumentStore>,
    users: Arc<dyn UserDirectory>,
    policy: AccessPolicy,
}

impl PrescriptionService {
    pub fn new(state: &AppState) -> Self {
        Self::with_stores(
            state.store.clone(),
            Arc::new(UserRepository::new(state.store.clone())),
        )
    }

    pub fn with_stores(store: Arc<dyn DocumentStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            store,
            users,
            policy: AccessPolicy::new(),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Prescription>, PrescriptionError> {
        let found = self
            .store
            .find_one(PRESCRIPTIONS_COLLECTION, &Filter::by_id(id))
            .await?;
        Ok(found.map(from_document::<Prescription>).transpose()?)
    }

    async fn find_many(&self, filter: Filter) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        let prescriptions = self
            .store
            .find(PRESCRIPTIONS_COLLECTION, &filter)
            .await?
            .into_iter()
            .map(from_document::<Prescription>)
            .collect::<Result<Vec<_>, _>>()?;
        let prescriptions = newest_first(prescriptions);

        let ids: Vec<Uuid> = prescriptions
            .iter()
            .flat_map(|p| [Some(p.patient_id), Some(p.doctor_id), p.filled_by])
            .flatten()
            .collect();
        let people = self.users.participants(&ids).await?;

        Ok(prescriptions
            .into_iter()
            .map(|prescription| PrescriptionView::new(prescription, &people))
            .collect())
    }

    pub async fn create_prescription(
        &self,
        user: &AuthUser,
        request: CreatePrescriptionRequest,
    ) -> Result<Prescription, PrescriptionError> {
        self.policy.require_role(user, Action::CreatePrescription)?;
        debug!("Doctor {} writing prescription", user.id);

        let patient_id = request
            .patient_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PrescriptionError::ValidationError("patientId is required".to_string()))
            .and_then(|raw| parse_id(raw, "patientId"))?;

        let medications = validate_medications(request.medications.as_deref().unwrap_or_default())?;
        let instructions = request.instructions.unwrap_or_default().trim().to_string();

        if self.users.find_with_role(patient_id, Role::Patient).await?.is_none() {
            return Err(PrescriptionError::PatientNotFound);
        }

        let prescription = Prescription {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: user.id,
            medications,
            instructions,
            date_prescribed: Utc::now(),
            status: PrescriptionStatus::Active,
            filled_by: None,
            date_filled: None,
        };

        let created = self
            .store
            .insert(PRESCRIPTIONS_COLLECTION, to_document(&prescription)?)
            .await?;
        let prescription: Prescription = from_document(created)?;

        info!("Prescription {} written for patient {}", prescription.id, patient_id);
        Ok(prescription)
    }

    pub async fn list_for_patient(
        &self,
        user: &AuthUser,
        patient_id: &str,
    ) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        self.policy.require_role(user, Action::ListPatientPrescriptions)?;
        let patient_id = parse_id(patient_id, "patient id")?;

        self.policy.require(
            user,
            Action::ListPatientPrescriptions,
            Ownership::from_match(user.id == patient_id),
        )?;

        self.find_many(Filter::new().eq("patient_id", patient_id.to_string()))
            .await
    }

    pub async fn list_own(&self, user: &AuthUser) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        self.policy.require_role(user, Action::ListOwnPrescriptions)?;
        self.find_many(Filter::new().eq("doctor_id", user.id.to_string()))
            .await
    }

    pub async fn list_pending(&self, user: &AuthUser) -> Result<Vec<PrescriptionView>, PrescriptionError> {
        self.policy.require_role(user, Action::ListPendingPrescriptions)?;
        self.find_many(Filter::new().eq("status", PrescriptionStatus::Active.as_str()))
            .await
    }

    pub async fn fill_prescription(
        &self,
        user: &AuthUser,
        prescription_id: &str,
    ) -> Result<Prescription, PrescriptionError> {
        self.policy.require_role(user, Action::FillPrescription)?;
        let id = parse_id(prescription_id, "prescription id")?;

        let current = self.find_by_id(id).await?.ok_or(PrescriptionError::NotFound)?;
        if current.status != PrescriptionStatus::Active {
            warn!("Fill refused for prescription {} in {}", id, current.status);
            return Err(PrescriptionError::NotActive(current.status));
        }

        let filled = self
            .close(
                id,
                json!({
                    "status": PrescriptionStatus::Completed.as_str(),
                    "filled_by": user.id,
                    "date_filled": Utc::now(),
                }),
            )
            .await?;

        info!("Prescription {} filled by pharmacist {}", id, user.id);
        Ok(filled)
    }

    /// Only the prescribing doctor may cancel; others get 403 once the
    /// prescription is loaded.
    pub async fn cancel_prescription(
        &self,
        user: &AuthUser,
        prescription_id: &str,
    ) -> Result<Prescription, PrescriptionError> {
        self.policy.require_role(user, Action::CancelPrescription)?;
        let id = parse_id(prescription_id, "prescription id")?;

        let current = self.find_by_id(id).await?.ok_or(PrescriptionError::NotFound)?;
        self.policy.require(
            user,
            Action::CancelPrescription,
            Ownership::from_match(current.doctor_id == user.id),
        )?;

        if current.status != PrescriptionStatus::Active {
            warn!("Cancel refused for prescription {} in {}", id, current.status);
            return Err(PrescriptionError::NotActive(current.status));
        }

        let cancelled = self
            .close(id, json!({ "status": PrescriptionStatus::Cancelled.as_str() }))
            .await?;

        info!("Prescription {} cancelled by doctor {}", id, user.id);
        Ok(cancelled)
    }

    /// Applies `patch` only while the prescription is still active.
    async fn close(
        &self,
        id: Uuid,
        patch: serde_json::Value,
    ) -> Result<Prescription, PrescriptionError> {
        let guard = Filter::by_id(id).eq("status", PrescriptionStatus::Active.as_str());
        let updated = self
            .store
            .update(PRESCRIPTIONS_COLLECTION, &guard, patch)
            .await?;

        match updated.into_iter().next() {
            Some(document) => Ok(from_document(document)?),
            None => match self.find_by_id(id).await? {
                Some(current) => {
                    warn!("Prescription {} changed concurrently, now {}", id, current.status);
                    Err(PrescriptionError::NotActive(current.status))
                }
                None => Err(PrescriptionError::NotFound),
            },
        }
    }
}
