// libs/matching-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{AppError, User};

use crate::models::{DoctorSearchQuery, MatchRequest, MatchingError};
use crate::repository::SupabaseDoctorDirectory;
use crate::services::{DirectoryService, MatcherService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

/// Search the doctor catalog (public endpoint)
#[axum::debug_handler]
pub async fn search_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let directory = SupabaseDoctorDirectory::new(&state);
    let service = DirectoryService::new(directory);

    let doctors = service
        .search_doctors(&query, None)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let total = doctors.len();
    Ok(Json(json!({
        "doctors": doctors,
        "total": total,
    })))
}

/// Get one doctor's public profile
#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let directory = SupabaseDoctorDirectory::new(&state);
    let service = DirectoryService::new(directory);

    let doctor = service
        .get_doctor(doctor_id, None)
        .await
        .map_err(|e| match e {
            MatchingError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "doctor": doctor })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

/// Rank doctors against the caller's required specialties
#[axum::debug_handler]
pub async fn match_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<Value>, AppError> {
    let directory = SupabaseDoctorDirectory::new(&state);
    let service = MatcherService::new(directory);

    let matches = service
        .rank_for_requirements(&request.specialties, request.limit, Some(auth.token()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let total = matches.len();
    Ok(Json(json!({
        "matches": matches,
        "total": total,
    })))
}
