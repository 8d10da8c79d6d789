// libs/appointment-cell/src/services/appointment.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use auth_cell::{UserDirectory, UserRepository};
use security_cell::{AccessPolicy, Action, Decision, Ownership};
use shared_database::AppState;
use shared_models::auth::{AuthUser, Role};
use shared_utils::dates::parse_datetime;

use crate::models::{
    Appointment, AppointmentAction, AppointmentError, AppointmentFilter, AppointmentView,
    CreateAppointmentRequest,
};
use crate::services::lifecycle::{AppointmentLifecycleService, INITIAL_STATUS};
use crate::services::store::{AppointmentStore, DocumentAppointmentStore};

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid {} format", what)))
}

fn policy_action(action: AppointmentAction) -> Action {
    match action {
        AppointmentAction::Approve => Action::ApproveAppointment,
        AppointmentAction::Deny => Action::DenyAppointment,
        AppointmentAction::Complete => Action::CompleteAppointment,
        AppointmentAction::Delete => Action::DeleteAppointment,
    }
}

pub struct AppointmentService {
    appointments: Arc<dyn AppointmentStore>,
    users: Arc<dyn UserDirectory>,
    policy: AccessPolicy,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(state: &AppState) -> Self {
        Self::with_stores(
            Arc::new(DocumentAppointmentStore::new(state.store.clone())),
            Arc::new(UserRepository::new(state.store.clone())),
        )
    }

    pub fn with_stores(
        appointments: Arc<dyn AppointmentStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            appointments,
            users,
            policy: AccessPolicy::new(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn create_appointment(
        &self,
        user: &AuthUser,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.policy.require_role(user, Action::CreateAppointment)?;
        debug!("Creating appointment for patient {}", user.id);

        let doctor_id = request
            .doctor_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppointmentError::ValidationError("doctorId is required".to_string()))
            .and_then(|raw| parse_id(raw, "doctorId"))?;

        let date = request
            .date
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppointmentError::ValidationError("date is required".to_string()))?;
        let date = parse_datetime(date)
            .ok_or_else(|| AppointmentError::ValidationError("Invalid date format".to_string()))?;

        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppointmentError::ValidationError("reason is required".to_string()))?
            .to_string();

        if self.users.find_with_role(user.id, Role::Patient).await?.is_none() {
            return Err(AppointmentError::PatientNotFound);
        }
        if self.users.find_with_role(doctor_id, Role::Doctor).await?.is_none() {
            return Err(AppointmentError::DoctorNotFound);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: user.id,
            doctor_id,
            date,
            reason,
            status: INITIAL_STATUS,
            created_at: now,
            updated_at: now,
        };

        let appointment = self.appointments.insert(appointment).await?;
        info!("Appointment {} requested by patient {}", appointment.id, user.id);
        Ok(appointment)
    }

    /// Scoped by role, ordered by date, each entry carrying the patient and
    /// doctor names.
    pub async fn list_appointments(
        &self,
        user: &AuthUser,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        self.policy.require_role(user, Action::ListAppointments)?;

        let filter = match user.role {
            Role::Patient => AppointmentFilter::for_patient(user.id),
            Role::Doctor => AppointmentFilter::for_doctor(user.id),
            Role::Nurse => AppointmentFilter::all(),
            role => {
                return Err(AppointmentError::Forbidden(security_cell::SecurityError::RoleDenied {
                    role,
                    action: Action::ListAppointments,
                }))
            }
        };

        let appointments = self.appointments.find_by_filter(filter).await?;

        let ids: Vec<Uuid> = appointments
            .iter()
            .flat_map(|a| [a.patient_id, a.doctor_id])
            .collect();
        let people = self.users.participants(&ids).await?;

        Ok(appointments
            .into_iter()
            .map(|appointment| AppointmentView::new(appointment, &people))
            .collect())
    }

    /// Non-participants see `NotFound`, never a 403 that would confirm the id.
    pub async fn get_appointment(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.policy.require_role(user, Action::ViewAppointment)?;
        let id = parse_id(appointment_id, "appointment id")?;

        let appointment = self
            .appointments
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let is_participant = appointment.is_patient(user.id) || appointment.is_doctor(user.id);
        let decision = self.policy.authorize(
            user.role,
            Action::ViewAppointment,
            Ownership::from_match(is_participant),
        );

        match decision {
            Decision::Allow => Ok(appointment),
            Decision::Deny => Err(AppointmentError::NotFound),
        }
    }

    pub async fn approve_appointment(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(user, appointment_id, AppointmentAction::Approve).await
    }

    pub async fn deny_appointment(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(user, appointment_id, AppointmentAction::Deny).await
    }

    /// Any doctor may complete an approved appointment, not only the assigned one.
    pub async fn complete_appointment(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(user, appointment_id, AppointmentAction::Complete).await
    }

    async fn transition(
        &self,
        user: &AuthUser,
        appointment_id: &str,
        action: AppointmentAction,
    ) -> Result<Appointment, AppointmentError> {
        self.policy.require_role(user, policy_action(action))?;
        let id = parse_id(appointment_id, "appointment id")?;

        let current = self
            .appointments
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let next = self
            .lifecycle
            .plan(user.role, current.status, action)?
            .ok_or(AppointmentError::TransitionNotPermitted {
                role: user.role,
                action,
            })?;

        let updated = self.appointments.update_status(id, current.status, next).await?;
        info!(
            "Appointment {} {}: {} -> {} by {}",
            id, action, current.status, updated.status, user.id
        );
        Ok(updated)
    }

    /// Only the owning patient may delete, and only while pending. Other
    /// patients' appointments answer `NotFound`.
    pub async fn delete_appointment(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<(), AppointmentError> {
        self.policy.require_role(user, Action::DeleteAppointment)?;
        let id = parse_id(appointment_id, "appointment id")?;

        let appointment = self
            .appointments
            .find_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        let ownership = Ownership::from_match(appointment.is_patient(user.id));
        if self.policy.authorize(user.role, Action::DeleteAppointment, ownership) == Decision::Deny {
            return Err(AppointmentError::NotFound);
        }

        self.lifecycle
            .plan(user.role, appointment.status, AppointmentAction::Delete)?;

        self.appointments.delete(id, appointment.status).await?;
        info!("Appointment {} deleted by patient {}", id, user.id);
        Ok(())
    }
}
