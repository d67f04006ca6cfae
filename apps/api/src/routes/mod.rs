pub mod health;
pub mod identity;

use axum::{
    routing::{get, post},
    Router,
};

use crate::consultation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Consultation API
        .route("/api/v1/consultations", get(handlers::handle_history))
        .route(
            "/api/v1/consultations/active",
            get(handlers::handle_get_active).post(handlers::handle_open),
        )
        .route(
            "/api/v1/consultations/messages",
            post(handlers::handle_send),
        )
        .route(
            "/api/v1/consultations/resync",
            post(handlers::handle_resync),
        )
        .with_state(state)
}
