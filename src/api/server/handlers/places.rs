use axum::extract::{Extension, Json, Path, Query};
use serde::Deserialize;

use crate::{api::DynAPI, entities::Place, error::Error};

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Unknown or malformed `type` values are ignored rather than rejected.
pub async fn list(
    Extension(api): Extension<DynAPI>,
    params: Option<Query<ListParams>>,
) -> Result<Json<Vec<Place>>, Error> {
    let kind = params
        .and_then(|Query(params)| params.kind)
        .and_then(|kind| kind.parse().ok());

    let places = api.list_places(kind).await?;

    Ok(places.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<String>,
) -> Result<Json<Place>, Error> {
    let place = api.find_place(&id).await?;

    Ok(place.into())
}
