// libs/matching-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use shared_config::AppConfig;
use shared_utils::auth_middleware;

use crate::handlers;

pub fn matching_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/doctors/search", get(handlers::search_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .with_state(state.clone());

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/matching/rank", post(handlers::match_doctors))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
