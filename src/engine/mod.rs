mod contact_api;
mod place_api;
mod rating_api;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    api::{HealthAPI, API},
    db::DynStore,
    external::{Mailer, RatingProvider},
};

/// Pause between upstream calls when the refresh job runs unattended.
pub const STANDALONE_PACING: Duration = Duration::from_millis(150);

#[derive(Clone, Debug, Default)]
pub struct ContactSettings {
    pub to: Option<String>,
    pub from: Option<String>,
}

pub struct Engine {
    store: DynStore,
    ratings: Arc<dyn RatingProvider>,
    places_api_key: Option<String>,
    mailer: Option<Arc<dyn Mailer>>,
    contact: ContactSettings,
    pacing: Option<Duration>,
}

impl Engine {
    pub fn new(store: DynStore, ratings: Arc<dyn RatingProvider>) -> Self {
        Self {
            store,
            ratings,
            places_api_key: None,
            mailer: None,
            contact: ContactSettings::default(),
            pacing: None,
        }
    }

    pub fn with_places_api_key(mut self, api_key: Option<String>) -> Self {
        self.places_api_key = api_key;
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>, contact: ContactSettings) -> Self {
        self.mailer = Some(mailer);
        self.contact = contact;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }
}

#[async_trait]
impl HealthAPI for Engine {
    async fn store_connected(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "store ping failed");
                false
            }
        }
    }
}

impl API for Engine {}
