use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/config", get(handlers::get_config))
        .route("/api/auth", post(handlers::login))
        .route("/api/auth/check", get(handlers::auth_check))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/data", get(handlers::get_data).post(handlers::put_data))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/intent", post(handlers::apply_intent))
        .with_state(state)
}
