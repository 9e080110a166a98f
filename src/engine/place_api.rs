use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::PlaceAPI,
    entities::{Place, PlaceType},
    error::{invalid_argument_error, not_found_error, Error},
};

#[async_trait]
impl PlaceAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_places(&self, kind: Option<PlaceType>) -> Result<Vec<Place>, Error> {
        self.store.list_places(kind).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_place(&self, id: &str) -> Result<Place, Error> {
        let id = Uuid::parse_str(id).map_err(|_| invalid_argument_error("invalid id"))?;

        self.store
            .find_place(id)
            .await?
            .ok_or_else(not_found_error)
    }
}
