use axum::extract::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::api::DynAPI;

/// Always 200; `db` reports whether the store answered a ping.
pub async fn check(Extension(api): Extension<DynAPI>) -> Json<Value> {
    let db = api.store_connected().await;

    Json(json!({
        "ok": true,
        "db": db,
        "ts": Utc::now().to_rfc3339(),
    }))
}
