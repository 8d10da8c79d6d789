// libs/appointment-cell/src/models.rs
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use auth_cell::Participant;
use security_cell::SecurityError;
use shared_database::StoreError;
use shared_models::auth::Role;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_patient(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id
    }

    pub fn is_doctor(&self, user_id: Uuid) -> bool {
        self.doctor_id == user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Denied,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Approved => "approved",
            AppointmentStatus::Denied => "denied",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing entry: the stored appointment with both participants resolved.
/// A participant whose account no longer exists serializes as `null`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<Participant>,
    pub doctor: Option<Participant>,
}

impl AppointmentView {
    pub fn new(appointment: Appointment, people: &HashMap<Uuid, Participant>) -> Self {
        Self {
            patient: people.get(&appointment.patient_id).cloned(),
            doctor: people.get(&appointment.doctor_id).cloned(),
            appointment,
        }
    }
}

/// Role-gated operations on an existing appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentAction {
    Approve,
    Deny,
    Complete,
    Delete,
}

impl fmt::Display for AppointmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentAction::Approve => write!(f, "approve"),
            AppointmentAction::Deny => write!(f, "deny"),
            AppointmentAction::Complete => write!(f, "complete"),
            AppointmentAction::Delete => write!(f, "delete"),
        }
    }
}

/// Which appointments a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

impl AppointmentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            doctor_id: None,
        }
    }

    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self {
            patient_id: None,
            doctor_id: Some(doctor_id),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Raw creation input; every field is validated by the service so malformed
/// values surface as 400s instead of extractor rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub doctor_id: Option<String>,
    pub date: Option<String>,
    pub reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Role {role} may not {action} appointments")]
    TransitionNotPermitted { role: Role, action: AppointmentAction },

    #[error(transparent)]
    Forbidden(#[from] SecurityError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
}
