use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{ContactOutcome, ContactRequest, Place, PlaceType, RefreshSummary};
use crate::error::Error;

#[async_trait]
pub trait PlaceAPI {
    async fn list_places(&self, kind: Option<PlaceType>) -> Result<Vec<Place>, Error>;
    async fn find_place(&self, id: &str) -> Result<Place, Error>;
}

#[async_trait]
pub trait RatingAPI {
    async fn refresh_ratings(&self, limit: usize) -> Result<RefreshSummary, Error>;
}

#[async_trait]
pub trait ContactAPI {
    async fn submit_contact(&self, request: ContactRequest) -> Result<ContactOutcome, Error>;
}

#[async_trait]
pub trait HealthAPI {
    async fn store_connected(&self) -> bool;
}

pub trait API: PlaceAPI + RatingAPI + ContactAPI + HealthAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
