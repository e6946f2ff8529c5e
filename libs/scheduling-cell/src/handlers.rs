// libs/scheduling-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, User};

use crate::models::{
    BookAppointmentRequest, CreateAvailabilityRequest, DayQuery, SchedulingError,
    UpdateAvailabilityRequest,
};
use crate::repository::SupabaseScheduleRepository;
use crate::router::SchedulingState;
use crate::services::{AvailabilityService, BookingService, SlotService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

/// Get a doctor's weekly availability rules (public endpoint)
#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<SchedulingState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = AvailabilityService::new(repository);

    let rules = service
        .list_rules(doctor_id, None)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let total = rules.len();
    Ok(Json(json!({
        "doctor_id": doctor_id,
        "rules": rules,
        "total": total,
    })))
}

/// Get a doctor's bookable slot grid for one day (public endpoint)
#[axum::debug_handler]
pub async fn get_day_slots(
    State(state): State<SchedulingState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = SlotService::new(repository, state.slot_cache.clone());

    let slots = service
        .generate_slots(doctor_id, query.date, None)
        .await
        .map_err(|e| match e {
            SchedulingError::InvalidSlotDuration => AppError::ValidationError(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        })?;

    let total = slots.len();
    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots,
        "total": total,
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

/// Create a weekly availability rule for the authenticated doctor
#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<SchedulingState>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let is_admin = user.role.as_deref() == Some("admin");
    if user.id != doctor_id.to_string() && !is_admin {
        return Err(AppError::Auth(
            "You can only manage your own availability".to_string(),
        ));
    }

    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = AvailabilityService::new(repository);

    let rule = service
        .create_rule(doctor_id, &request, auth.token())
        .await
        .map_err(|e| match e {
            SchedulingError::ValidationError(msg) => AppError::ValidationError(msg),
            SchedulingError::InvalidSlotDuration => AppError::ValidationError(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "message": "Availability rule created",
        "rule": rule,
    })))
}

/// Update (or retire) one of the authenticated doctor's rules
#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<SchedulingState>,
    Path((doctor_id, rule_id)): Path<(Uuid, Uuid)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let is_admin = user.role.as_deref() == Some("admin");
    if user.id != doctor_id.to_string() && !is_admin {
        return Err(AppError::Auth(
            "You can only manage your own availability".to_string(),
        ));
    }

    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = AvailabilityService::new(repository);

    let rule = service
        .update_rule(doctor_id, rule_id, &request, auth.token())
        .await
        .map_err(|e| match e {
            SchedulingError::RuleNotFound => {
                AppError::NotFound("Availability rule not found".to_string())
            }
            SchedulingError::ValidationError(msg) => AppError::ValidationError(msg),
            SchedulingError::InvalidSlotDuration => AppError::ValidationError(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "message": "Availability rule updated",
        "rule": rule,
    })))
}

/// Book an appointment at an offered slot start
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<SchedulingState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let is_admin = user.role.as_deref() == Some("admin");
    let is_companion = user.role.as_deref() == Some("companion");
    let booking_for_self = user.id == request.patient_id.to_string();
    if !booking_for_self && !is_companion && !is_admin {
        return Err(AppError::Auth(
            "You can only book appointments for yourself".to_string(),
        ));
    }

    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = BookingService::new(repository, state.slot_cache.clone());

    let appointment = service
        .book_appointment(&request, auth.token())
        .await
        .map_err(|e| match e {
            SchedulingError::SlotTaken => AppError::Conflict(e.to_string()),
            SchedulingError::SlotInPast => AppError::Unprocessable(e.to_string()),
            SchedulingError::SlotMismatch => AppError::Unprocessable(e.to_string()),
            SchedulingError::InvalidSlotDuration => AppError::ValidationError(e.to_string()),
            SchedulingError::ValidationError(msg) => AppError::ValidationError(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "message": "Appointment booked",
        "appointment": appointment,
    })))
}

/// Cancel an appointment, freeing its slot
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = BookingService::new(repository, state.slot_cache.clone());

    let appointment = service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(|e| match e {
            SchedulingError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            _ => AppError::Internal(e.to_string()),
        })?;

    let is_admin = user.role.as_deref() == Some("admin");
    let is_participant = user.id == appointment.patient_id.to_string()
        || user.id == appointment.doctor_id.to_string();
    if !is_participant && !is_admin {
        return Err(AppError::Auth(
            "You can only cancel your own appointments".to_string(),
        ));
    }

    let cancelled = service
        .cancel_appointment(appointment_id, auth.token())
        .await
        .map_err(|e| match e {
            SchedulingError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            SchedulingError::InvalidStatusTransition(_) => AppError::Conflict(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "message": "Appointment cancelled",
        "appointment": cancelled,
    })))
}

/// A doctor's appointments for one day, cancelled ones included
#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<SchedulingState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let is_admin = user.role.as_deref() == Some("admin");
    if user.id != doctor_id.to_string() && !is_admin {
        return Err(AppError::Auth(
            "You can only view your own schedule".to_string(),
        ));
    }

    let repository = SupabaseScheduleRepository::new(&state.config);
    let service = BookingService::new(repository, state.slot_cache.clone());

    let appointments = service
        .get_day_appointments(doctor_id, query.date, auth.token())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let total = appointments.len();
    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "appointments": appointments,
        "total": total,
    })))
}
