use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Place;
use crate::error::{internal_error, Error};
use crate::external::google_places::PlaceDetails;

pub const DEFAULT_REFRESH_LIMIT: usize = 100;
pub const MAX_REFRESH_LIMIT: usize = 200;

/// Turns a requested batch size into one the job will honor. Missing,
/// unparseable or non-positive requests fall back to the default.
pub fn clamp_limit(requested: Option<&str>) -> usize {
    match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
        Some(limit) if limit > 0 => (limit as u64).min(MAX_REFRESH_LIMIT as u64) as usize,
        _ => DEFAULT_REFRESH_LIMIT,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    #[serde(rename_all = "camelCase")]
    Updated {
        rating: Option<f64>,
        user_ratings_total: Option<u64>,
    },
    Failed {
        error: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RefreshResult {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub updated: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<RefreshResult>,
}

impl RefreshSummary {
    pub fn record(&mut self, result: RefreshResult) {
        match result.outcome {
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
        self.total += 1;
        self.results.push(result);
    }
}

#[derive(Debug)]
pub enum ItemState {
    Pending,
    InFlight,
    Succeeded(Place),
    Failed(String),
}

/// One place moving through a refresh run. The stored record is only ever
/// replaced by the value carried in `Succeeded`.
#[derive(Debug)]
pub struct RefreshItem {
    pub place: Place,
    pub state: ItemState,
}

impl RefreshItem {
    pub fn new(place: Place) -> Self {
        Self {
            place,
            state: ItemState::Pending,
        }
    }

    pub fn external_place_id(&self) -> Option<&str> {
        self.place.external_place_id.as_deref()
    }

    pub fn begin(&mut self) -> Result<(), Error> {
        match self.state {
            ItemState::Pending => {
                self.state = ItemState::InFlight;
                Ok(())
            }
            _ => Err(internal_error("refresh item already started")),
        }
    }

    /// Applies fetched details. Null values keep what the place already had;
    /// the refresh timestamp always moves forward.
    pub fn succeed(&mut self, details: PlaceDetails, now: DateTime<Utc>) -> Result<Place, Error> {
        if !matches!(self.state, ItemState::InFlight) {
            return Err(internal_error("refresh item not in flight"));
        }

        let mut updated = self.place.clone();
        updated.rating = details.rating.or(updated.rating);
        updated.user_ratings_total = details.user_ratings_total.or(updated.user_ratings_total);

        let refreshed_at = match updated.rating_updated_at {
            Some(previous) if previous >= now => previous + Duration::milliseconds(1),
            _ => now,
        };
        updated.rating_updated_at = Some(refreshed_at);
        updated.updated_at = refreshed_at.max(updated.updated_at);

        self.state = ItemState::Succeeded(updated.clone());

        Ok(updated)
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = ItemState::Failed(message.into());
    }

    pub fn into_result(self) -> RefreshResult {
        let outcome = match self.state {
            ItemState::Succeeded(place) => Outcome::Updated {
                rating: place.rating,
                user_ratings_total: place.user_ratings_total,
            },
            ItemState::Failed(error) => Outcome::Failed { error },
            ItemState::Pending | ItemState::InFlight => Outcome::Failed {
                error: "not processed".into(),
            },
        };

        RefreshResult {
            id: self.place.id,
            name: self.place.name,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Coordinates, NewPlace, PlaceType};
    use serde_json::json;

    fn place() -> Place {
        let mut place = NewPlace {
            name: "Lagos de Covadonga".into(),
            kind: PlaceType::Activity,
            description: String::new(),
            rating: Some(4.9),
            address: String::new(),
            url: None,
            images: vec![],
            coords: Coordinates { lat: 43.271, lng: -4.999 },
            external_place_id: Some("ChIJ-covadonga".into()),
            user_ratings_total: Some(1200),
        }
        .into_place(Utc::now());
        place.rating_updated_at = None;
        place
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some("50")), 50);
        assert_eq!(clamp_limit(Some("200")), 200);
        assert_eq!(clamp_limit(Some("9999")), 200);
        assert_eq!(clamp_limit(Some("0")), 100);
        assert_eq!(clamp_limit(Some("-3")), 100);
        assert_eq!(clamp_limit(Some("many")), 100);
    }

    #[test]
    fn null_details_keep_existing_values() {
        let mut item = RefreshItem::new(place());
        item.begin().unwrap();

        let now = Utc::now();
        let updated = item
            .succeed(
                PlaceDetails {
                    rating: None,
                    user_ratings_total: Some(1300),
                    external_url: None,
                },
                now,
            )
            .unwrap();

        assert_eq!(updated.rating, Some(4.9));
        assert_eq!(updated.user_ratings_total, Some(1300));
        assert_eq!(updated.rating_updated_at, Some(now));
    }

    #[test]
    fn refresh_timestamp_strictly_increases_under_skew() {
        let mut original = place();
        let later = Utc::now() + Duration::hours(1);
        original.rating_updated_at = Some(later);

        let mut item = RefreshItem::new(original);
        item.begin().unwrap();
        let updated = item.succeed(PlaceDetails::default(), Utc::now()).unwrap();

        assert!(updated.rating_updated_at.unwrap() > later);
    }

    #[test]
    fn succeed_requires_in_flight() {
        let mut item = RefreshItem::new(place());
        assert!(item.succeed(PlaceDetails::default(), Utc::now()).is_err());

        item.begin().unwrap();
        assert!(item.begin().is_err());
    }

    #[test]
    fn results_serialize_flat() {
        let mut item = RefreshItem::new(place());
        item.begin().unwrap();
        item.fail("Places status=NOT_FOUND (no msg)");
        let failed = serde_json::to_value(item.into_result()).unwrap();

        assert_eq!(failed["name"], "Lagos de Covadonga");
        assert_eq!(failed["error"], "Places status=NOT_FOUND (no msg)");
        assert!(failed.get("rating").is_none());

        let mut summary = RefreshSummary::default();
        let mut item = RefreshItem::new(place());
        item.begin().unwrap();
        item.succeed(
            PlaceDetails {
                rating: Some(4.8),
                user_ratings_total: Some(1400),
                external_url: None,
            },
            Utc::now(),
        )
        .unwrap();
        summary.record(item.into_result());

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["updated"], 1);
        assert_eq!(value["failed"], 0);
        assert_eq!(value["results"][0]["rating"], json!(4.8));
        assert_eq!(value["results"][0]["userRatingsTotal"], 1400);
    }
}
