// =====================================================================================
// ACCESS POLICY - DECLARATIVE ROLE x ACTION x OWNERSHIP TABLE
// =====================================================================================

use tracing::{debug, instrument, warn};

use shared_models::auth::{AuthUser, Role};

use crate::models::{Action, Decision, Ownership, PolicyRule, Requirement, SecurityError};

const fn rule(role: Role, action: Action, requirement: Requirement) -> PolicyRule {
    PolicyRule {
        role,
        action,
        requirement,
    }
}

/// Anything not listed is denied.
pub static POLICY: &[PolicyRule] = &[
    // Appointments
    rule(Role::Patient, Action::CreateAppointment, Requirement::Any),
    rule(Role::Patient, Action::ListAppointments, Requirement::Any),
    rule(Role::Doctor, Action::ListAppointments, Requirement::Any),
    rule(Role::Nurse, Action::ListAppointments, Requirement::Any),
    rule(Role::Patient, Action::ViewAppointment, Requirement::Owner),
    rule(Role::Doctor, Action::ViewAppointment, Requirement::Owner),
    rule(Role::Nurse, Action::ViewAppointment, Requirement::Any),
    rule(Role::Nurse, Action::ApproveAppointment, Requirement::Any),
    rule(Role::Nurse, Action::DenyAppointment, Requirement::Any),
    rule(Role::Doctor, Action::CompleteAppointment, Requirement::Any),
    rule(Role::Patient, Action::DeleteAppointment, Requirement::Owner),
    // Records
    rule(Role::Doctor, Action::UploadRecord, Requirement::Any),
    rule(Role::Patient, Action::ListRecords, Requirement::Any),
    rule(Role::Doctor, Action::ListRecords, Requirement::Any),
    // Prescriptions
    rule(Role::Doctor, Action::CreatePrescription, Requirement::Any),
    rule(Role::Patient, Action::ListPatientPrescriptions, Requirement::Owner),
    rule(Role::Doctor, Action::ListPatientPrescriptions, Requirement::Any),
    rule(Role::Nurse, Action::ListPatientPrescriptions, Requirement::Any),
    rule(Role::Pharmacist, Action::ListPatientPrescriptions, Requirement::Any),
    rule(Role::Doctor, Action::ListOwnPrescriptions, Requirement::Any),
    rule(Role::Pharmacist, Action::FillPrescription, Requirement::Any),
    rule(Role::Doctor, Action::CancelPrescription, Requirement::Owner),
    rule(Role::Pharmacist, Action::ListPendingPrescriptions, Requirement::Any),
    // Inventory
    rule(Role::Pharmacist, Action::ManageInventory, Requirement::Any),
    rule(Role::Admin, Action::ManageInventory, Requirement::Any),
    rule(Role::Pharmacist, Action::ViewLowStock, Requirement::Any),
    rule(Role::Admin, Action::ViewLowStock, Requirement::Any),
    rule(Role::Patient, Action::ViewInventory, Requirement::Any),
    rule(Role::Doctor, Action::ViewInventory, Requirement::Any),
    rule(Role::Nurse, Action::ViewInventory, Requirement::Any),
    rule(Role::Pharmacist, Action::ViewInventory, Requirement::Any),
    rule(Role::Admin, Action::ViewInventory, Requirement::Any),
    // Directory
    rule(Role::Patient, Action::ListDoctors, Requirement::Any),
    rule(Role::Doctor, Action::ListDoctors, Requirement::Any),
    rule(Role::Nurse, Action::ListDoctors, Requirement::Any),
    rule(Role::Pharmacist, Action::ListDoctors, Requirement::Any),
    rule(Role::Admin, Action::ListDoctors, Requirement::Any),
];

/// Stateless authorization gate over a policy table.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    rules: &'static [PolicyRule],
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self { rules: POLICY }
    }

    fn find_rule(&self, role: Role, action: Action) -> Option<&PolicyRule> {
        self.rules
            .iter()
            .find(|rule| rule.role == role && rule.action == action)
    }

    pub fn authorize(&self, role: Role, action: Action, ownership: Ownership) -> Decision {
        match self.find_rule(role, action) {
            Some(rule) => match rule.requirement {
                Requirement::Any => Decision::Allow,
                Requirement::Owner if ownership == Ownership::Owner => Decision::Allow,
                Requirement::Owner => Decision::Deny,
            },
            None => Decision::Deny,
        }
    }

    /// Whether any row grants `action` to `role`. Used to reject before a
    /// resource is loaded.
    pub fn permits_role(&self, role: Role, action: Action) -> bool {
        self.find_rule(role, action).is_some()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    pub fn require_role(&self, user: &AuthUser, action: Action) -> Result<(), SecurityError> {
        if self.permits_role(user.role, action) {
            debug!("Role check passed for {:?}", action);
            Ok(())
        } else {
            warn!("Role {} denied for {:?}", user.role, action);
            Err(SecurityError::RoleDenied {
                role: user.role,
                action,
            })
        }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role))]
    pub fn require(
        &self,
        user: &AuthUser,
        action: Action,
        ownership: Ownership,
    ) -> Result<(), SecurityError> {
        self.require_role(user, action)?;

        match self.authorize(user.role, action, ownership) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                warn!("Ownership check failed for {:?}", action);
                Err(SecurityError::NotOwner { action })
            }
        }
    }
}
