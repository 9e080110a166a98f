use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PlaceStore;
use crate::entities::{Place, PlaceType};
use crate::error::{conflict_error, not_found_error, service_unavailable_error, Error};

/// In-process place store with the same rules as [`super::PgStore`]. It can
/// be switched offline to exercise outage handling.
#[derive(Debug)]
pub struct MemoryStore {
    places: RwLock<HashMap<Uuid, Place>>,
    online: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            places: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), Error> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(service_unavailable_error("memory store offline"))
        }
    }

    fn check_unique(places: &HashMap<Uuid, Place>, place: &Place) -> Result<(), Error> {
        let Some(external_id) = place.external_place_id.as_deref() else {
            return Ok(());
        };

        let taken = places.values().any(|other| {
            other.id != place.id && other.external_place_id.as_deref() == Some(external_id)
        });

        if taken {
            return Err(conflict_error("duplicate resource"));
        }

        Ok(())
    }
}

#[async_trait]
impl PlaceStore for MemoryStore {
    async fn ping(&self) -> Result<(), Error> {
        self.check_online()
    }

    async fn list_places(&self, kind: Option<PlaceType>) -> Result<Vec<Place>, Error> {
        self.check_online()?;

        let places = self.places.read().await;
        let mut result: Vec<Place> = places
            .values()
            .filter(|place| kind.map_or(true, |kind| place.kind == kind))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(result)
    }

    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, Error> {
        self.check_online()?;

        Ok(self.places.read().await.get(&id).cloned())
    }

    async fn find_stale_places(&self, limit: usize) -> Result<Vec<Place>, Error> {
        self.check_online()?;

        let places = self.places.read().await;
        let mut result: Vec<Place> = places
            .values()
            .filter(|place| place.external_place_id.is_some())
            .cloned()
            .collect();
        // None sorts before Some
        result.sort_by_key(|place| (place.rating_updated_at, place.id));
        result.truncate(limit);

        Ok(result)
    }

    async fn insert_place(&self, place: &Place) -> Result<(), Error> {
        self.check_online()?;
        place.ensure_valid()?;

        let mut places = self.places.write().await;
        if places.contains_key(&place.id) {
            return Err(conflict_error("duplicate resource"));
        }
        Self::check_unique(&places, place)?;
        places.insert(place.id, place.clone());

        Ok(())
    }

    async fn update_place(&self, place: &Place) -> Result<(), Error> {
        self.check_online()?;
        place.ensure_valid()?;

        let mut places = self.places.write().await;
        if !places.contains_key(&place.id) {
            return Err(not_found_error());
        }
        Self::check_unique(&places, place)?;
        places.insert(place.id, place.clone());

        Ok(())
    }

    async fn delete_all_places(&self) -> Result<u64, Error> {
        self.check_online()?;

        let mut places = self.places.write().await;
        let count = places.len() as u64;
        places.clear();

        Ok(count)
    }

    async fn import_places(&self, places: &[Place], replace: bool) -> Result<u64, Error> {
        self.check_online()?;
        for place in places {
            place.ensure_valid()?;
        }

        let mut stored = self.places.write().await;

        // staged copy, swapped in only when every insert succeeded
        let mut staged = if replace { HashMap::new() } else { stored.clone() };
        for place in places {
            if staged.contains_key(&place.id) {
                return Err(conflict_error("duplicate resource"));
            }
            Self::check_unique(&staged, place)?;
            staged.insert(place.id, place.clone());
        }

        let deleted = if replace { stored.len() as u64 } else { 0 };
        *stored = staged;

        Ok(deleted)
    }
}
