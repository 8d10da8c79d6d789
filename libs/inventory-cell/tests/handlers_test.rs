use assert_matches::assert_matches;
use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};

use inventory_cell::handlers::{
    add_medicine, delete_medicine, list_medicines, low_stock, search_medicines, update_medicine,
};
use inventory_cell::models::{InventoryInput, SearchQuery};
use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;
use shared_utils::test_utils::{TestConfig, TestUser};

fn create_state() -> AppState {
    AppState::in_memory(TestConfig::default().to_app_config())
}

fn pharmacist() -> AuthUser {
    TestUser::pharmacist().to_user()
}

fn medicine(name: &str, generic: &str, quantity: i64) -> InventoryInput {
    InventoryInput {
        medicine_name: Some(name.to_string()),
        generic_name: Some(generic.to_string()),
        category: Some("Analgesic".to_string()),
        quantity: Some(quantity),
        unit: Some("tablet".to_string()),
        price_per_unit: Some(0.25),
        supplier: Some("MediSupply".to_string()),
        expiry_date: Some("2027-06-30".to_string()),
        reorder_level: None,
        batch_number: Some("B-2041".to_string()),
    }
}

async fn add(state: &AppState, input: InventoryInput) -> String {
    let (status, Json(body)) = add_medicine(State(state.clone()), Extension(pharmacist()), JsonBody(input))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn search(query: Option<&str>) -> Query<SearchQuery> {
    Query(SearchQuery {
        query: query.map(str::to_string),
    })
}

#[tokio::test]
async fn test_add_medicine_defaults() {
    let state = create_state();

    let (status, Json(body)) = add_medicine(
        State(state),
        Extension(pharmacist()),
        JsonBody(medicine("Panadol", "Paracetamol", 100)),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["medicine_name"], "Panadol");
    assert_eq!(body["reorder_level"], 10);
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn test_add_medicine_validation() {
    let state = create_state();

    let negative = InventoryInput {
        quantity: Some(-5),
        ..medicine("Panadol", "Paracetamol", 0)
    };
    let result = add_medicine(State(state.clone()), Extension(pharmacist()), JsonBody(negative)).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));

    let missing_supplier = InventoryInput {
        supplier: None,
        ..medicine("Panadol", "Paracetamol", 3)
    };
    let result = add_medicine(State(state.clone()), Extension(pharmacist()), JsonBody(missing_supplier)).await;
    assert_matches!(result, Err(AppError::ValidationError(msg)) if msg.contains("supplier"));

    let negative_price = InventoryInput {
        price_per_unit: Some(-1.0),
        ..medicine("Panadol", "Paracetamol", 3)
    };
    let result = add_medicine(State(state), Extension(pharmacist()), JsonBody(negative_price)).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_duplicate_active_name_conflicts() {
    let state = create_state();
    let id = add(&state, medicine("Panadol", "Paracetamol", 50)).await;

    let result = add_medicine(
        State(state.clone()),
        Extension(pharmacist()),
        JsonBody(medicine("PANADOL", "Paracetamol", 10)),
    )
    .await;
    assert_matches!(result, Err(AppError::Conflict(_)));

    // Name is free again once the first entry is soft-deleted
    delete_medicine(State(state.clone()), Extension(pharmacist()), Path(id))
        .await
        .unwrap();
    add(&state, medicine("Panadol", "Paracetamol", 10)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_keep_one_active_name() {
    let state = create_state();

    let tasks: Vec<_> = ["Amoxil", "AMOXIL", "amoxil", "Amoxil"]
        .into_iter()
        .map(|name| {
            tokio::spawn(add_medicine(
                State(state.clone()),
                Extension(pharmacist()),
                JsonBody(medicine(name, "Amoxicillin", 20)),
            ))
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!((created, conflicts), (1, 3));

    let Json(items) = list_medicines(State(state), Extension(pharmacist())).await.unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_manage_inventory_roles() {
    let state = create_state();
    let admin = TestUser::admin().to_user();
    let nurse = TestUser::nurse().to_user();

    add_medicine(
        State(state.clone()),
        Extension(admin),
        JsonBody(medicine("Brufen", "Ibuprofen", 40)),
    )
    .await
    .unwrap();

    let result = add_medicine(
        State(state.clone()),
        Extension(nurse.clone()),
        JsonBody(medicine("Zyrtec", "Cetirizine", 40)),
    )
    .await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    let result = low_stock(State(state.clone()), Extension(nurse.clone())).await;
    assert_matches!(result, Err(AppError::Forbidden(_)));

    // Everyone may read the catalogue
    let Json(body) = list_medicines(State(state), Extension(nurse)).await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_sorted_and_soft_delete() {
    let state = create_state();
    add(&state, medicine("Zyrtec", "Cetirizine", 20)).await;
    let amoxil = add(&state, medicine("Amoxil", "Amoxicillin", 5)).await;
    add(&state, medicine("Lipitor", "Atorvastatin", 8)).await;

    let patient = TestUser::patient().to_user();
    let Json(body) = list_medicines(State(state.clone()), Extension(patient.clone()))
        .await
        .unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["medicine_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Amoxil", "Lipitor", "Zyrtec"]);

    delete_medicine(State(state.clone()), Extension(pharmacist()), Path(amoxil.clone()))
        .await
        .unwrap();

    let Json(body) = list_medicines(State(state.clone()), Extension(patient.clone()))
        .await
        .unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);

    let Json(body) = low_stock(State(state.clone()), Extension(pharmacist()))
        .await
        .unwrap();
    let low: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["medicine_name"].as_str().unwrap())
        .collect();
    assert_eq!(low, vec!["Lipitor"]);

    let Json(body) = search_medicines(State(state.clone()), Extension(patient), search(Some("amox")))
        .await
        .unwrap();
    assert!(body.as_array().unwrap().is_empty());

    let result = delete_medicine(State(state.clone()), Extension(pharmacist()), Path(amoxil.clone())).await;
    assert_matches!(result, Err(AppError::NotFound(_)));

    let result = update_medicine(
        State(state),
        Extension(pharmacist()),
        Path(amoxil),
        JsonBody(InventoryInput {
            quantity: Some(100),
            ..InventoryInput::default()
        }),
    )
    .await;
    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_low_stock_threshold_inclusive() {
    let state = create_state();
    add(&state, medicine("Exactly", "Tenamol", 10)).await;
    add(&state, medicine("Plenty", "Elevenol", 11)).await;
    add(&state, medicine("Empty", "Zeronol", 0)).await;

    let Json(body) = low_stock(State(state), Extension(pharmacist())).await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["medicine_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Empty", "Exactly"]);
}

#[tokio::test]
async fn test_partial_update() {
    let state = create_state();
    let id = add(&state, medicine("Panadol", "Paracetamol", 50)).await;
    add(&state, medicine("Brufen", "Ibuprofen", 50)).await;

    let Json(body) = update_medicine(
        State(state.clone()),
        Extension(pharmacist()),
        Path(id.clone()),
        JsonBody(InventoryInput {
            quantity: Some(7),
            price_per_unit: Some(0.3),
            ..InventoryInput::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["quantity"], 7);
    assert_eq!(body["medicine_name"], "Panadol");
    assert_eq!(body["supplier"], "MediSupply");

    let result = update_medicine(
        State(state.clone()),
        Extension(pharmacist()),
        Path(id.clone()),
        JsonBody(InventoryInput {
            quantity: Some(-1),
            ..InventoryInput::default()
        }),
    )
    .await;
    assert_matches!(result, Err(AppError::ValidationError(_)));

    let Json(body) = update_medicine(
        State(state.clone()),
        Extension(pharmacist()),
        Path(id.clone()),
        JsonBody(InventoryInput {
            medicine_name: Some("PANADOL".to_string()),
            ..InventoryInput::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["medicine_name"], "PANADOL");

    let result = update_medicine(
        State(state),
        Extension(pharmacist()),
        Path(id),
        JsonBody(InventoryInput {
            medicine_name: Some("brufen".to_string()),
            ..InventoryInput::default()
        }),
    )
    .await;
    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_search_case_insensitive_on_both_names() {
    let state = create_state();
    add(&state, medicine("Panadol", "Paracetamol", 50)).await;
    add(&state, medicine("Tylenol", "Paracetamol", 50)).await;
    add(&state, medicine("Brufen", "Ibuprofen", 50)).await;
    add(&state, medicine("C++ Syrup (x)", "Placebo", 50)).await;

    let doctor = TestUser::doctor().to_user();

    let Json(body) = search_medicines(State(state.clone()), Extension(doctor.clone()), search(Some("PARACET")))
        .await
        .unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);

    let Json(body) = search_medicines(State(state.clone()), Extension(doctor.clone()), search(Some("bru")))
        .await
        .unwrap();
    assert_eq!(body[0]["medicine_name"], "Brufen");

    // Regex metacharacters are matched literally
    let Json(body) = search_medicines(State(state.clone()), Extension(doctor.clone()), search(Some("c++ syrup (")))
        .await
        .unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);

    let result = search_medicines(State(state.clone()), Extension(doctor.clone()), search(Some("  "))).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));

    let result = search_medicines(State(state), Extension(doctor), search(None)).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}
