mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Place, PlaceType};
use crate::error::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Durable storage of place documents.
///
/// Every write validates the place first and is rejected as a whole when any
/// field is invalid. `external_place_id` is unique among the places that set
/// it.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Round-trips to the backing store.
    async fn ping(&self) -> Result<(), Error>;

    /// Places of the given type (or all), ordered by name, byte-wise.
    async fn list_places(&self, kind: Option<PlaceType>) -> Result<Vec<Place>, Error>;

    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, Error>;

    /// Up to `limit` places that carry an external place id, least recently
    /// refreshed first, never-refreshed before everything else.
    async fn find_stale_places(&self, limit: usize) -> Result<Vec<Place>, Error>;

    async fn insert_place(&self, place: &Place) -> Result<(), Error>;

    async fn update_place(&self, place: &Place) -> Result<(), Error>;

    async fn delete_all_places(&self) -> Result<u64, Error>;

    /// Inserts every place, after deleting the existing ones when `replace`
    /// is set, as a single unit: on any error nothing is changed. Returns the
    /// number of deleted places.
    async fn import_places(&self, places: &[Place], replace: bool) -> Result<u64, Error>;
}

pub type DynStore = Arc<dyn PlaceStore>;
