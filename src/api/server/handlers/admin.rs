use axum::extract::{Extension, Json, Query};
use axum::http::{header::AUTHORIZATION, Request};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::{
    api::DynAPI,
    entities::{clamp_limit, RefreshSummary},
    error::{unauthorized_error, Error},
};

/// Bearer token that admin routes require. `None` locks them entirely.
#[derive(Clone, Debug)]
pub struct AdminToken(pub Option<String>);

fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn is_admin<B>(req: &Request<B>) -> bool {
    let expected = req
        .extensions()
        .get::<AdminToken>()
        .and_then(|token| token.0.as_deref());

    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match (expected, provided) {
        (Some(expected), Some(provided)) => tokens_match(expected, provided),
        _ => false,
    }
}

/// Guards the admin routes: the request must carry `Authorization: Bearer <token>`.
pub async fn require_admin<B>(req: Request<B>, next: Next<B>) -> Result<Response, Error> {
    if !is_admin(&req) {
        return Err(unauthorized_error());
    }

    Ok(next.run(req).await)
}

#[derive(Deserialize)]
pub struct RefreshParams {
    limit: Option<String>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    ok: bool,
    #[serde(flatten)]
    summary: RefreshSummary,
}

pub async fn refresh_ratings(
    Extension(api): Extension<DynAPI>,
    params: Option<Query<RefreshParams>>,
) -> Result<Json<RefreshResponse>, Error> {
    let limit = params.and_then(|Query(params)| params.limit);
    let summary = api.refresh_ratings(clamp_limit(limit.as_deref())).await?;

    Ok(RefreshResponse { ok: true, summary }.into())
}
