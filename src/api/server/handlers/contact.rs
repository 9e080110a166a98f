use axum::extract::{rejection::JsonRejection, Extension, Json};
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::{
    api::DynAPI,
    entities::{ContactOutcome, ContactRequest},
    error::{validation_error, Error},
};

pub async fn submit(
    Extension(api): Extension<DynAPI>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let Json(request) =
        payload.map_err(|rejection| validation_error(vec![format!("body: {}", rejection)]))?;

    match api.submit_contact(request).await? {
        ContactOutcome::Sent => Ok((StatusCode::OK, Json(json!({ "ok": true })))),
        ContactOutcome::Skipped(reason) => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "ok": true, "skipped": reason })),
        )),
    }
}
