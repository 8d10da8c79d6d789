// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::auth::Role;

use crate::models::{AppointmentAction, AppointmentError, AppointmentStatus};

/// One legal edge of the appointment state graph. `to == None` removes the
/// appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AppointmentStatus,
    pub action: AppointmentAction,
    pub role: Role,
    pub to: Option<AppointmentStatus>,
}

pub static TRANSITIONS: &[Transition] = &[
    Transition {
        from: AppointmentStatus::Pending,
        action: AppointmentAction::Approve,
        role: Role::Nurse,
        to: Some(AppointmentStatus::Approved),
    },
    Transition {
        from: AppointmentStatus::Pending,
        action: AppointmentAction::Deny,
        role: Role::Nurse,
        to: Some(AppointmentStatus::Denied),
    },
    Transition {
        from: AppointmentStatus::Approved,
        action: AppointmentAction::Complete,
        role: Role::Doctor,
        to: Some(AppointmentStatus::Completed),
    },
    Transition {
        from: AppointmentStatus::Pending,
        action: AppointmentAction::Delete,
        role: Role::Patient,
        to: None,
    },
];

pub const INITIAL_STATUS: AppointmentStatus = AppointmentStatus::Pending;

#[derive(Debug, Clone, Copy)]
pub struct AppointmentLifecycleService {
    transitions: &'static [Transition],
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self {
            transitions: TRANSITIONS,
        }
    }

    /// Resolves `action` by `role` against `current_status`. Returns the
    /// resulting status, or `None` when the action removes the appointment.
    ///
    /// A role with no edge for the action at all is refused outright; a role
    /// that owns the action but not from this state gets a state conflict.
    pub fn plan(
        &self,
        role: Role,
        current_status: AppointmentStatus,
        action: AppointmentAction,
    ) -> Result<Option<AppointmentStatus>, AppointmentError> {
        let mut role_edges = self
            .transitions
            .iter()
            .filter(|t| t.action == action && t.role == role)
            .peekable();

        if role_edges.peek().is_none() {
            warn!("Role {} has no {} transition", role, action);
            return Err(AppointmentError::TransitionNotPermitted { role, action });
        }

        match role_edges.find(|t| t.from == current_status) {
            Some(transition) => {
                debug!(
                    "Planned {}: {} -> {:?}",
                    action, current_status, transition.to
                );
                Ok(transition.to)
            }
            None => {
                warn!("Cannot {} an appointment that is {}", action, current_status);
                Err(AppointmentError::InvalidStatusTransition(current_status))
            }
        }
    }
}
