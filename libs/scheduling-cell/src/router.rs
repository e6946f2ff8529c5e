// libs/scheduling-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use shared_config::AppConfig;
use shared_utils::auth_middleware;

use crate::handlers;
use crate::services::SlotCache;

/// Shared state for scheduling routes. The cache outlives individual
/// requests, so it rides alongside the per-request config handle.
#[derive(Clone)]
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub slot_cache: Arc<SlotCache>,
}

impl SchedulingState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let slot_cache = Arc::new(SlotCache::new(
            config.slot_cache_ttl_seconds,
            config.slot_cache_max_entries,
        ));
        Self { config, slot_cache }
    }
}

pub fn scheduling_routes(state: SchedulingState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route(
            "/doctors/{doctor_id}/availability",
            get(handlers::get_doctor_availability),
        )
        .route("/doctors/{doctor_id}/slots", get(handlers::get_day_slots))
        .with_state(state.clone());

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/doctors/{doctor_id}/availability",
            post(handlers::create_availability),
        )
        .route(
            "/doctors/{doctor_id}/availability/{rule_id}",
            put(handlers::update_availability),
        )
        .route(
            "/doctors/{doctor_id}/appointments",
            get(handlers::get_doctor_appointments),
        )
        .route("/appointments", post(handlers::book_appointment))
        .route(
            "/appointments/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
