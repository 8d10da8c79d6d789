// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::auth::Role;
use shared_models::error::AppError;

// =====================================================================================
// AUTHORIZATION MODELS
// =====================================================================================

/// Every operation an endpoint may ask the gate about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateAppointment,
    ListAppointments,
    ViewAppointment,
    ApproveAppointment,
    DenyAppointment,
    CompleteAppointment,
    DeleteAppointment,
    UploadRecord,
    ListRecords,
    CreatePrescription,
    ListPatientPrescriptions,
    ListOwnPrescriptions,
    FillPrescription,
    CancelPrescription,
    ListPendingPrescriptions,
    ManageInventory,
    ViewInventory,
    ViewLowStock,
    ListDoctors,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Action::CreateAppointment => "create appointments",
            Action::ListAppointments => "list appointments",
            Action::ViewAppointment => "view this appointment",
            Action::ApproveAppointment => "approve appointments",
            Action::DenyAppointment => "deny appointments",
            Action::CompleteAppointment => "complete appointments",
            Action::DeleteAppointment => "delete this appointment",
            Action::UploadRecord => "upload records",
            Action::ListRecords => "view records",
            Action::CreatePrescription => "create prescriptions",
            Action::ListPatientPrescriptions => "view these prescriptions",
            Action::ListOwnPrescriptions => "list written prescriptions",
            Action::FillPrescription => "fill prescriptions",
            Action::CancelPrescription => "cancel this prescription",
            Action::ListPendingPrescriptions => "list pending prescriptions",
            Action::ManageInventory => "manage inventory",
            Action::ViewInventory => "view inventory",
            Action::ViewLowStock => "view low stock",
            Action::ListDoctors => "list doctors",
        };
        f.write_str(text)
    }
}

/// What a policy row demands of the resource relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Any,
    Owner,
}

/// Ownership fact supplied by the endpoint for the resource at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    NotApplicable,
    Unknown,
    Owner,
    NotOwner,
}

impl Ownership {
    pub fn from_match(is_owner: bool) -> Self {
        if is_owner {
            Ownership::Owner
        } else {
            Ownership::NotOwner
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyRule {
    pub role: Role,
    pub action: Action,
    pub requirement: Requirement,
}

// =====================================================================================
// ERRORS
// =====================================================================================

#[derive(Error, Debug, PartialEq)]
pub enum SecurityError {
    #[error("Role {role} is not allowed to {action}")]
    RoleDenied { role: Role, action: Action },

    #[error("Only the owner may {action}")]
    NotOwner { action: Action },

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<SecurityError> for AppError {
    fn from(e: SecurityError) -> Self {
        match e {
            SecurityError::RoleDenied { .. } | SecurityError::NotOwner { .. } => {
                AppError::Forbidden(e.to_string())
            }
            SecurityError::Hashing(msg) => AppError::Internal(msg),
        }
    }
}
