use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use auth_cell::Participant;
use security_cell::SecurityError;
use shared_database::StoreError;

// ==============================================================================
// PRESCRIPTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub instructions: String,
    pub date_prescribed: DateTime<Utc>,
    pub status: PrescriptionStatus,
    pub filled_by: Option<Uuid>,
    pub date_filled: Option<DateTime<Utc>>,
}

/// Listing entry with the patient, prescribing doctor and, once filled, the
/// pharmacist resolved to names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub patient: Option<Participant>,
    pub doctor: Option<Participant>,
    pub pharmacist: Option<Participant>,
}

impl PrescriptionView {
    pub fn new(prescription: Prescription, people: &HashMap<Uuid, Participant>) -> Self {
        Self {
            patient: people.get(&prescription.patient_id).cloned(),
            doctor: people.get(&prescription.doctor_id).cloned(),
            pharmacist: prescription.filled_by.and_then(|id| people.get(&id).cloned()),
            prescription,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub medicine: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Active,
    Completed,
    Cancelled,
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::Active => "active",
            PrescriptionStatus::Completed => "completed",
            PrescriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_id: Option<String>,
    pub medications: Option<Vec<MedicationInput>>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationInput {
    pub medicine: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Prescription not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Prescription is already {0}")]
    NotActive(PrescriptionStatus),

    #[error(transparent)]
    Forbidden(#[from] SecurityError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
}
