use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn index() -> &'static str {
    concat!(
        "Authentication API (PostgREST version) ",
        env!("CARGO_PKG_VERSION"),
        ", ",
        env!("CARGO_PKG_AUTHORS")
    )
}

/// Service and store metadata. Never includes credentials.
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "author": env!("CARGO_PKG_AUTHORS"),
        "store_url": state.config.database.url,
        "store_collection": state.config.database.collection,
        "store_email_columns": state.config.database.email_columns,
        "store_key_format": state.config.database.key_format,
        "token_secret_set": state.auth_service.tokens().has_secret(),
    }))
}

/// Health check handler
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
