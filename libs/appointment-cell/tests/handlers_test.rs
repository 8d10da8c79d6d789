use assert_matches::assert_matches;
use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
};

use appointment_cell::handlers::{
    approve_appointment, complete_appointment, create_appointment, delete_appointment,
    deny_appointment, get_appointment, list_appointments,
};
use appointment_cell::models::CreateAppointmentRequest;
use auth_cell::test_support::{seed_named_user, seed_user};
use shared_database::AppState;
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;
use shared_utils::test_utils::{TestConfig, TestUser};

fn create_state() -> AppState {
    AppState::in_memory(TestConfig::default().to_app_config())
}

fn booking(doctor: &AuthUser, date: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        doctor_id: Some(doctor.id.to_string()),
        date: Some(date.to_string()),
        reason: Some("Persistent cough".to_string()),
    }
}

async fn book(state: &AppState, patient: &AuthUser, doctor: &AuthUser) -> String {
    let (status, Json(body)) = create_appointment(
        State(state.clone()),
        Extension(patient.clone()),
        JsonBody(booking(doctor, "2025-03-01T10:00:00Z")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_appointment_starts_pending() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;

    let (status, Json(body)) = create_appointment(
        State(state),
        Extension(patient.clone()),
        JsonBody(booking(&doctor, "2025-03-01T10:00:00Z")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["appointment"]["patient_id"], patient.id.to_string());
    assert_eq!(body["appointment"]["doctor_id"], doctor.id.to_string());
    assert_eq!(body["appointment"]["reason"], "Persistent cough");
}

#[tokio::test]
async fn test_create_appointment_requires_patient_role() {
    let state = create_state();
    let nurse = seed_user(&state, Role::Nurse).await;
    let doctor = seed_user(&state, Role::Doctor).await;

    let result = create_appointment(
        State(state),
        Extension(nurse),
        JsonBody(booking(&doctor, "2025-03-01T10:00:00Z")),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_create_appointment_validation() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;

    let missing_reason = CreateAppointmentRequest {
        reason: None,
        ..booking(&doctor, "2025-03-01")
    };
    let result = create_appointment(
        State(state.clone()),
        Extension(patient.clone()),
        JsonBody(missing_reason),
    )
    .await;
    assert_matches!(result, Err(AppError::ValidationError(_)));

    let result = create_appointment(
        State(state.clone()),
        Extension(patient.clone()),
        JsonBody(booking(&doctor, "sometime soon")),
    )
    .await;
    assert_matches!(result, Err(AppError::ValidationError(msg)) if msg.contains("date"));

    let bad_doctor = CreateAppointmentRequest {
        doctor_id: Some("not-a-uuid".to_string()),
        ..booking(&doctor, "2025-03-01")
    };
    let result = create_appointment(State(state), Extension(patient), JsonBody(bad_doctor)).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_create_appointment_unknown_doctor() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    // Registered, but as a nurse
    let not_a_doctor = seed_user(&state, Role::Nurse).await;

    let result = create_appointment(
        State(state.clone()),
        Extension(patient),
        JsonBody(booking(&not_a_doctor, "2025-03-01")),
    )
    .await;
    assert_matches!(result, Err(AppError::NotFound(msg)) if msg == "Doctor not found");
}

#[tokio::test]
async fn test_create_appointment_unknown_patient() {
    let state = create_state();
    let doctor = seed_user(&state, Role::Doctor).await;
    let ghost = TestUser::patient().to_user();

    let result = create_appointment(
        State(state),
        Extension(ghost),
        JsonBody(booking(&doctor, "2025-03-01")),
    )
    .await;
    assert_matches!(result, Err(AppError::NotFound(msg)) if msg == "Patient not found");
}

#[tokio::test]
async fn test_full_lifecycle_pending_approved_completed() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let nurse = seed_user(&state, Role::Nurse).await;
    let id = book(&state, &patient, &doctor).await;

    let Json(body) = approve_appointment(State(state.clone()), Extension(nurse), Path(id.clone()))
        .await
        .unwrap();
    assert_eq!(body["appointment"]["status"], "approved");

    let Json(body) = complete_appointment(State(state.clone()), Extension(doctor), Path(id.clone()))
        .await
        .unwrap();
    assert_eq!(body["appointment"]["status"], "completed");

    let Json(body) = get_appointment(State(state), Extension(patient), Path(id))
        .await
        .unwrap();
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_patient_cannot_approve() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let id = book(&state, &patient, &doctor).await;

    let result = approve_appointment(State(state.clone()), Extension(patient.clone()), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    let result = deny_appointment(State(state.clone()), Extension(doctor), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    let Json(body) = get_appointment(State(state), Extension(patient), Path(id))
        .await
        .unwrap();
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_double_approve_conflicts() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let nurse = seed_user(&state, Role::Nurse).await;
    let id = book(&state, &patient, &doctor).await;

    approve_appointment(State(state.clone()), Extension(nurse.clone()), Path(id.clone()))
        .await
        .unwrap();

    let result = approve_appointment(State(state.clone()), Extension(nurse.clone()), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::Conflict(_)));

    let result = deny_appointment(State(state), Extension(nurse), Path(id)).await;
    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_complete_requires_approval() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let id = book(&state, &patient, &doctor).await;

    let result = complete_appointment(State(state), Extension(doctor), Path(id)).await;
    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_denied_is_terminal() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let nurse = seed_user(&state, Role::Nurse).await;
    let id = book(&state, &patient, &doctor).await;

    deny_appointment(State(state.clone()), Extension(nurse.clone()), Path(id.clone()))
        .await
        .unwrap();

    let result = approve_appointment(State(state.clone()), Extension(nurse), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::Conflict(_)));

    let result = complete_appointment(State(state.clone()), Extension(doctor), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::Conflict(_)));

    let result = delete_appointment(State(state), Extension(patient), Path(id)).await;
    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_transition_on_missing_appointment() {
    let state = create_state();
    let nurse = seed_user(&state, Role::Nurse).await;

    let result = approve_appointment(
        State(state.clone()),
        Extension(nurse.clone()),
        Path(uuid::Uuid::new_v4().to_string()),
    )
    .await;
    assert_matches!(result, Err(AppError::NotFound(_)));

    let result = approve_appointment(State(state), Extension(nurse), Path("42".to_string())).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_gate_runs_before_lookup() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;

    // A forbidden role learns nothing about whether the id exists.
    let result = approve_appointment(
        State(state),
        Extension(patient),
        Path(uuid::Uuid::new_v4().to_string()),
    )
    .await;
    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_listing_is_scoped_by_role() {
    let state = create_state();
    let alice = seed_user(&state, Role::Patient).await;
    let bob = seed_user(&state, Role::Patient).await;
    let dr_one = seed_user(&state, Role::Doctor).await;
    let dr_two = seed_user(&state, Role::Doctor).await;
    let nurse = seed_user(&state, Role::Nurse).await;
    let pharmacist = seed_user(&state, Role::Pharmacist).await;

    book(&state, &alice, &dr_one).await;
    book(&state, &alice, &dr_two).await;
    book(&state, &bob, &dr_one).await;

    let Json(body) = list_appointments(State(state.clone()), Extension(alice.clone()))
        .await
        .unwrap();
    let own = body.as_array().unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|a| a["patient_id"] == alice.id.to_string()));

    let Json(body) = list_appointments(State(state.clone()), Extension(dr_one.clone()))
        .await
        .unwrap();
    let assigned = body.as_array().unwrap();
    assert_eq!(assigned.len(), 2);
    assert!(assigned.iter().all(|a| a["doctor_id"] == dr_one.id.to_string()));

    let Json(body) = list_appointments(State(state.clone()), Extension(nurse))
        .await
        .unwrap();
    assert_eq!(body.as_array().unwrap().len(), 3);

    let result = list_appointments(State(state), Extension(pharmacist)).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_listing_carries_participant_names() {
    let state = create_state();
    let patient = seed_named_user(&state, Role::Patient, "Ana Ruiz").await;
    let doctor = seed_named_user(&state, Role::Doctor, "Dr. Grey").await;
    let patient_user = AuthUser::new(patient.id, patient.role);
    let doctor_user = AuthUser::new(doctor.id, doctor.role);
    let nurse = seed_user(&state, Role::Nurse).await;

    book(&state, &patient_user, &doctor_user).await;

    for viewer in [patient_user, doctor_user, nurse] {
        let Json(body) = list_appointments(State(state.clone()), Extension(viewer))
            .await
            .unwrap();
        let entry = &body[0];

        assert_eq!(entry["patient"]["id"], patient.id.to_string());
        assert_eq!(entry["patient"]["name"], "Ana Ruiz");
        assert_eq!(entry["patient"]["username"], patient.username.as_str());
        assert_eq!(entry["doctor"]["name"], "Dr. Grey");
        assert_eq!(entry["doctor"]["username"], doctor.username.as_str());
        assert_eq!(entry["patient_id"], patient.id.to_string());
        assert_eq!(entry["status"], "pending");
        assert!(entry["doctor"].get("password_hash").is_none());
    }
}

#[tokio::test]
async fn test_listing_sorted_by_date() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;

    for date in ["2025-05-01", "2025-01-15", "2025-03-10"] {
        create_appointment(
            State(state.clone()),
            Extension(patient.clone()),
            JsonBody(booking(&doctor, date)),
        )
        .await
        .unwrap();
    }

    let Json(body) = list_appointments(State(state), Extension(patient)).await.unwrap();
    let dates: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["date"].as_str().unwrap().to_string())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn test_get_appointment_hidden_from_non_participants() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let stranger = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let other_doctor = seed_user(&state, Role::Doctor).await;
    let nurse = seed_user(&state, Role::Nurse).await;
    let id = book(&state, &patient, &doctor).await;

    for viewer in [stranger, other_doctor] {
        let result = get_appointment(State(state.clone()), Extension(viewer), Path(id.clone())).await;
        assert_matches!(result, Err(AppError::NotFound(_)));
    }

    for viewer in [patient, doctor, nurse] {
        let Json(body) = get_appointment(State(state.clone()), Extension(viewer), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(body["id"], id);
    }
}

#[tokio::test]
async fn test_delete_pending_by_owner() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let id = book(&state, &patient, &doctor).await;

    delete_appointment(State(state.clone()), Extension(patient.clone()), Path(id.clone()))
        .await
        .unwrap();

    let result = get_appointment(State(state), Extension(patient), Path(id)).await;
    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_other_patients_appointment_is_not_found() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let stranger = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let id = book(&state, &patient, &doctor).await;

    let result = delete_appointment(State(state.clone()), Extension(stranger), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::NotFound(_)));

    let result = delete_appointment(State(state.clone()), Extension(doctor), Path(id.clone())).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    let Json(body) = get_appointment(State(state), Extension(patient), Path(id))
        .await
        .unwrap();
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_delete_after_approval_conflicts() {
    let state = create_state();
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let nurse = seed_user(&state, Role::Nurse).await;
    let id = book(&state, &patient, &doctor).await;

    approve_appointment(State(state.clone()), Extension(nurse), Path(id.clone()))
        .await
        .unwrap();

    let result = delete_appointment(State(state), Extension(patient), Path(id)).await;
    assert_matches!(result, Err(AppError::Conflict(_)));
}
