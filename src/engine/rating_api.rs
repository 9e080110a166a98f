use super::Engine;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    api::RatingAPI,
    entities::{Outcome, Place, RefreshItem, RefreshSummary, MAX_REFRESH_LIMIT},
    error::{internal_error, Error},
};

impl Engine {
    /// Drives one place from pending to succeeded or failed. The stored record
    /// is only written on success.
    #[tracing::instrument(skip_all, fields(id = %place.id))]
    async fn refresh_place(&self, place: Place, api_key: &str) -> RefreshItem {
        let mut item = RefreshItem::new(place);

        if let Err(err) = item.begin() {
            item.fail(err.message);
            return item;
        }

        let external_id = match item.external_place_id() {
            Some(id) => id.to_string(),
            None => {
                item.fail("missing external place id");
                return item;
            }
        };

        let details = match self.ratings.fetch_details(&external_id, api_key).await {
            Ok(details) => details,
            Err(err) => {
                item.fail(err.message);
                return item;
            }
        };

        match item.succeed(details, Utc::now()) {
            Ok(updated) => {
                if let Err(err) = self.store.update_place(&updated).await {
                    item.fail(err.message);
                }
            }
            Err(err) => item.fail(err.message),
        }

        item
    }
}

#[async_trait]
impl RatingAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn refresh_ratings(&self, limit: usize) -> Result<RefreshSummary, Error> {
        let api_key = self
            .places_api_key
            .as_deref()
            .ok_or_else(|| internal_error("missing GOOGLE_PLACES_API_KEY"))?;

        let limit = limit.clamp(1, MAX_REFRESH_LIMIT);
        let places = self.store.find_stale_places(limit).await?;

        let mut summary = RefreshSummary::default();

        for (i, place) in places.into_iter().enumerate() {
            if i > 0 {
                if let Some(pacing) = self.pacing {
                    tokio::time::sleep(pacing).await;
                }
            }

            let result = self.refresh_place(place, api_key).await.into_result();

            match &result.outcome {
                Outcome::Updated {
                    rating,
                    user_ratings_total,
                } => tracing::info!(
                    name = %result.name,
                    ?rating,
                    ?user_ratings_total,
                    "rating refreshed"
                ),
                Outcome::Failed { error } => {
                    tracing::warn!(name = %result.name, %error, "rating refresh failed")
                }
            }

            summary.record(result);
        }

        tracing::info!(
            updated = summary.updated,
            failed = summary.failed,
            total = summary.total,
            "rating refresh done"
        );

        Ok(summary)
    }
}
