use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

/// Facts reported by the liveness probe.
#[derive(Debug, Clone)]
pub struct HealthState {
    pub prefix: String,
    pub commands: usize,
    pub reminder_interval_minutes: u64,
}

pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health: liveness probe, returns bot metadata.
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "prefix": state.prefix,
        "commands": state.commands,
        "reminder_interval_minutes": state.reminder_interval_minutes,
    }))
}
