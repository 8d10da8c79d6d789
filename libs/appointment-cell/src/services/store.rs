// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{from_document, to_document, DocumentStore, Filter};

use crate::models::{Appointment, AppointmentError, AppointmentFilter, AppointmentStatus};

pub const APPOINTMENTS_COLLECTION: &str = "appointments";

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    async fn find_by_filter(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Moves `id` from `expected` to `new_status` only if it is still in
    /// `expected`. A concurrent writer that got there first yields
    /// `InvalidStatusTransition` carrying the status it left behind.
    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError>;

    /// Removes `id` only while it is still in `expected`.
    async fn delete(&self, id: Uuid, expected: AppointmentStatus) -> Result<(), AppointmentError>;
}

/// [`AppointmentStore`] over the shared document store.
pub struct DocumentAppointmentStore {
    store: Arc<dyn DocumentStore>,
}

impl DocumentAppointmentStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// After a guarded write matched nothing, decide whether the appointment
    /// vanished or moved on.
    async fn guard_failure(&self, id: Uuid) -> AppointmentError {
        match self.find_by_id(id).await {
            Ok(Some(current)) => {
                warn!("Appointment {} changed concurrently, now {}", id, current.status);
                AppointmentError::InvalidStatusTransition(current.status)
            }
            Ok(None) => AppointmentError::NotFound,
            Err(e) => e,
        }
    }
}

#[async_trait]
impl AppointmentStore for DocumentAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let created = self
            .store
            .insert(APPOINTMENTS_COLLECTION, to_document(&appointment)?)
            .await?;
        Ok(from_document(created)?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let found = self
            .store
            .find_one(APPOINTMENTS_COLLECTION, &Filter::by_id(id))
            .await?;
        Ok(found.map(from_document::<Appointment>).transpose()?)
    }

    async fn find_by_filter(
        &self,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query = Filter::new();
        if let Some(patient_id) = filter.patient_id {
            query = query.eq("patient_id", patient_id.to_string());
        }
        if let Some(doctor_id) = filter.doctor_id {
            query = query.eq("doctor_id", doctor_id.to_string());
        }

        let documents = self.store.find(APPOINTMENTS_COLLECTION, &query).await?;
        let mut appointments = documents
            .into_iter()
            .map(from_document::<Appointment>)
            .collect::<Result<Vec<_>, _>>()?;

        appointments.sort_by_key(|a| a.date);
        Ok(appointments)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Conditional status update {}: {} -> {}", id, expected, new_status);

        let guard = Filter::by_id(id).eq("status", expected.as_str());
        let patch = json!({
            "status": new_status.as_str(),
            "updated_at": Utc::now(),
        });

        let updated = self
            .store
            .update(APPOINTMENTS_COLLECTION, &guard, patch)
            .await?;

        match updated.into_iter().next() {
            Some(document) => Ok(from_document(document)?),
            None => Err(self.guard_failure(id).await),
        }
    }

    async fn delete(&self, id: Uuid, expected: AppointmentStatus) -> Result<(), AppointmentError> {
        let guard = Filter::by_id(id).eq("status", expected.as_str());
        let removed = self.store.delete(APPOINTMENTS_COLLECTION, &guard).await?;

        if removed == 0 {
            return Err(self.guard_failure(id).await);
        }
        Ok(())
    }
}
