use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::state::AppState;

pub mod admin;
pub mod auth;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .merge(auth::router(state.clone()))
        .merge(admin::router(state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
