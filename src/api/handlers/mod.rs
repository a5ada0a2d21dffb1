//! HTTP handlers, one module per resource

pub mod auth;
pub mod tickets;
pub mod users;

use super::AppState;
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

/// `GET /`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("{} API is running", state.context.config.clinic.name)
    }))
}
