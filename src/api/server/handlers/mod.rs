pub mod admin;
pub mod contact;
pub mod health;
pub mod places;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> &'static str {
    "Casa Pin API"
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "ok": false, "error": "route not found" })),
    )
}
