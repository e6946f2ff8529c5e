use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::get,
};
use serde_json::{json, Value};

use matching_cell::router::matching_routes;
use scheduling_cell::router::{scheduling_routes, SchedulingState};
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let scheduling_state = SchedulingState::new(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(scheduling_state.clone());

    Router::new()
        .route("/", get(|| async { "Serena Telehealth API is running!" }))
        .merge(health_routes)
        .merge(scheduling_routes(scheduling_state))
        .merge(matching_routes(state))
}

async fn health_check(State(state): State<SchedulingState>) -> Json<Value> {
    let stats = state.slot_cache.stats();
    Json(json!({
        "status": "ok",
        "slot_cache": stats,
    }))
}
