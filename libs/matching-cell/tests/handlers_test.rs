// libs/matching-cell/tests/handlers_test.rs
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::{Extension, Json, Path, Query, State};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use matching_cell::handlers;
use matching_cell::models::{DoctorSearchQuery, MatchRequest};
use shared_config::AppConfig;
use shared_models::{AppError, User};
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_state(mock_server: &MockServer) -> Arc<AppConfig> {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    Arc::new(config)
}

fn create_test_user_extension(role: &str, id: &str) -> Extension<User> {
    Extension(User {
        id: id.to_string(),
        email: Some(format!("{}@example.com", role)),
        role: Some(role.to_string()),
        metadata: None,
        created_at: Some(Utc::now()),
    })
}

fn create_auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    let auth = Authorization::bearer(token).unwrap();
    TypedHeader(auth)
}

fn patient_token() -> String {
    let user = TestUser::patient("patient@example.com");
    JwtTestUtils::create_test_token(&user, &TestConfig::default().jwt_secret, None)
}

fn empty_search_query() -> DoctorSearchQuery {
    DoctorSearchQuery {
        specialty: None,
        min_experience: None,
        language: None,
        limit: None,
        offset: None,
    }
}

async fn mock_doctor_catalog(mock_server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

// ==============================================================================
// MATCHING ENDPOINT
// ==============================================================================

#[tokio::test]
async fn test_match_doctors_orders_by_score() {
    let mock_server = MockServer::start().await;
    mock_doctor_catalog(
        &mock_server,
        json!([
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                "Dr. Broader",
                &["trauma-ptsd", "depression-anxiety"]
            ),
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                "Dr. Focused",
                &["trauma-ptsd"]
            ),
        ]),
    )
    .await;

    let state = create_test_state(&mock_server);
    let result = handlers::match_doctors(
        State(state),
        create_auth_header(&patient_token()),
        create_test_user_extension("patient", &Uuid::new_v4().to_string()),
        Json(MatchRequest {
            specialties: vec!["Trauma PTSD".to_string()],
            limit: None,
        }),
    )
    .await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 2);
    assert_eq!(body["matches"][0]["doctor"]["name"], "Dr. Focused");
    assert_eq!(body["matches"][0]["match_score"], 100);
    assert_eq!(body["matches"][1]["doctor"]["name"], "Dr. Broader");
    assert_eq!(body["matches"][1]["match_score"], 85);
}

#[tokio::test]
async fn test_match_doctors_neutral_when_no_requirements() {
    let mock_server = MockServer::start().await;
    mock_doctor_catalog(
        &mock_server,
        json!([MockSupabaseResponses::doctor_row(
            &Uuid::new_v4().to_string(),
            "Dr. Anyone",
            &["sleep-disorders"]
        )]),
    )
    .await;

    let state = create_test_state(&mock_server);
    let result = handlers::match_doctors(
        State(state),
        create_auth_header(&patient_token()),
        create_test_user_extension("patient", &Uuid::new_v4().to_string()),
        Json(MatchRequest {
            specialties: vec![],
            limit: None,
        }),
    )
    .await;

    let body = result.unwrap().0;
    assert_eq!(body["matches"][0]["match_score"], 60);
}

#[tokio::test]
async fn test_match_doctors_treats_unknown_requirements_as_empty() {
    let mock_server = MockServer::start().await;
    mock_doctor_catalog(
        &mock_server,
        json!([MockSupabaseResponses::doctor_row(
            &Uuid::new_v4().to_string(),
            "Dr. Anyone",
            &["trauma-ptsd"]
        )]),
    )
    .await;

    let state = create_test_state(&mock_server);
    let result = handlers::match_doctors(
        State(state),
        create_auth_header(&patient_token()),
        create_test_user_extension("patient", &Uuid::new_v4().to_string()),
        Json(MatchRequest {
            specialties: vec!["cardiology".to_string()],
            limit: None,
        }),
    )
    .await;

    let body = result.unwrap().0;
    assert_eq!(body["matches"][0]["match_score"], 60);
}

#[tokio::test]
async fn test_match_doctors_caps_results_at_five() {
    let mock_server = MockServer::start().await;
    let rows: Vec<serde_json::Value> = (0..7)
        .map(|i| {
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                &format!("Dr. {}", i),
                &["trauma-ptsd"],
            )
        })
        .collect();
    mock_doctor_catalog(&mock_server, json!(rows)).await;

    let state = create_test_state(&mock_server);
    let result = handlers::match_doctors(
        State(state),
        create_auth_header(&patient_token()),
        create_test_user_extension("patient", &Uuid::new_v4().to_string()),
        Json(MatchRequest {
            specialties: vec!["trauma-ptsd".to_string()],
            limit: None,
        }),
    )
    .await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 5);
}

#[tokio::test]
async fn test_match_doctors_honors_caller_limit() {
    let mock_server = MockServer::start().await;
    let rows: Vec<serde_json::Value> = (0..4)
        .map(|i| {
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                &format!("Dr. {}", i),
                &["trauma-ptsd"],
            )
        })
        .collect();
    mock_doctor_catalog(&mock_server, json!(rows)).await;

    let state = create_test_state(&mock_server);
    let result = handlers::match_doctors(
        State(state),
        create_auth_header(&patient_token()),
        create_test_user_extension("patient", &Uuid::new_v4().to_string()),
        Json(MatchRequest {
            specialties: vec!["trauma-ptsd".to_string()],
            limit: Some(2),
        }),
    )
    .await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_match_doctors_skips_ineligible_profiles() {
    let mock_server = MockServer::start().await;
    let mut unapproved = MockSupabaseResponses::doctor_row(
        &Uuid::new_v4().to_string(),
        "Dr. Unapproved",
        &["trauma-ptsd"],
    );
    unapproved["approved"] = json!(false);
    let mut wrong_role = MockSupabaseResponses::doctor_row(
        &Uuid::new_v4().to_string(),
        "Dr. Admin",
        &["trauma-ptsd"],
    );
    wrong_role["role"] = json!("admin");
    let eligible = MockSupabaseResponses::doctor_row(
        &Uuid::new_v4().to_string(),
        "Dr. Eligible",
        &["trauma-ptsd"],
    );
    mock_doctor_catalog(&mock_server, json!([unapproved, wrong_role, eligible])).await;

    let state = create_test_state(&mock_server);
    let result = handlers::match_doctors(
        State(state),
        create_auth_header(&patient_token()),
        create_test_user_extension("patient", &Uuid::new_v4().to_string()),
        Json(MatchRequest {
            specialties: vec!["trauma-ptsd".to_string()],
            limit: None,
        }),
    )
    .await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 1);
    assert_eq!(body["matches"][0]["doctor"]["name"], "Dr. Eligible");
}

// ==============================================================================
// DIRECTORY ENDPOINTS
// ==============================================================================

#[tokio::test]
async fn test_search_doctors_filters_by_specialty() {
    let mock_server = MockServer::start().await;
    mock_doctor_catalog(
        &mock_server,
        json!([
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                "Dr. Trauma",
                &["trauma-ptsd"]
            ),
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                "Dr. Sleep",
                &["sleep-disorders"]
            ),
        ]),
    )
    .await;

    let state = create_test_state(&mock_server);
    let mut query = empty_search_query();
    query.specialty = Some("Trauma PTSD".to_string());
    let result = handlers::search_doctors(State(state), Query(query)).await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 1);
    assert_eq!(body["doctors"][0]["name"], "Dr. Trauma");
}

#[tokio::test]
async fn test_search_doctors_unknown_specialty_matches_nothing() {
    let mock_server = MockServer::start().await;

    let state = create_test_state(&mock_server);
    let mut query = empty_search_query();
    query.specialty = Some("cardiology".to_string());
    let result = handlers::search_doctors(State(state), Query(query)).await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_search_doctors_applies_limit_and_offset() {
    let mock_server = MockServer::start().await;
    let rows: Vec<serde_json::Value> = (0..4)
        .map(|i| {
            MockSupabaseResponses::doctor_row(
                &Uuid::new_v4().to_string(),
                &format!("Dr. {}", i),
                &["general-psychiatry"],
            )
        })
        .collect();
    mock_doctor_catalog(&mock_server, json!(rows)).await;

    let state = create_test_state(&mock_server);
    let mut query = empty_search_query();
    query.limit = Some(2);
    query.offset = Some(1);
    let result = handlers::search_doctors(State(state), Query(query)).await;

    let body = result.unwrap().0;
    assert_eq!(body["total"], 2);
    assert_eq!(body["doctors"][0]["name"], "Dr. 1");
    assert_eq!(body["doctors"][1]["name"], "Dr. 2");
}

#[tokio::test]
async fn test_get_doctor_success() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    mock_doctor_catalog(
        &mock_server,
        json!([MockSupabaseResponses::doctor_row(
            &doctor_id.to_string(),
            "Dr. Profile",
            &["bipolar-disorder"]
        )]),
    )
    .await;

    let state = create_test_state(&mock_server);
    let result = handlers::get_doctor(State(state), Path(doctor_id)).await;

    let body = result.unwrap().0;
    assert_eq!(body["doctor"]["name"], "Dr. Profile");
    assert_eq!(body["doctor"]["specialties"][0], "bipolar-disorder");
}

#[tokio::test]
async fn test_get_doctor_not_found() {
    let mock_server = MockServer::start().await;
    mock_doctor_catalog(&mock_server, json!([])).await;

    let state = create_test_state(&mock_server);
    let result = handlers::get_doctor(State(state), Path(Uuid::new_v4())).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}
