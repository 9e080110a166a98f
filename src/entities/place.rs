use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{validation_error, Error};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_ADDRESS_LEN: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    Beach,
    Restaurant,
    Activity,
    Poi,
}

impl PlaceType {
    pub const ALL: [PlaceType; 4] = [Self::Beach, Self::Restaurant, Self::Activity, Self::Poi];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Beach => "beach",
            Self::Restaurant => "restaurant",
            Self::Activity => "activity",
            Self::Poi => "poi",
        }
    }
}

impl FromStr for PlaceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlaceType,
    #[serde(default)]
    pub description: String,
    pub rating: Option<f64>,
    #[serde(default)]
    pub address: String,
    pub url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub coords: Coordinates,
    pub external_place_id: Option<String>,
    pub user_ratings_total: Option<u64>,
    pub rating_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Import/seed shape of a place: everything but the system-managed fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlace {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlaceType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_rating")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub coords: Coordinates,
    #[serde(default)]
    pub external_place_id: Option<String>,
    #[serde(default)]
    pub user_ratings_total: Option<u64>,
}

fn default_rating() -> Option<f64> {
    Some(0.0)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn violations_error(violations: Vec<Violation>) -> Error {
    validation_error(violations.iter().map(ToString::to_string).collect())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NewPlace {
    pub fn into_place(self, now: DateTime<Utc>) -> Place {
        Place {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            kind: self.kind,
            description: self.description,
            rating: self.rating,
            address: self.address,
            url: blank_to_none(self.url),
            images: self.images,
            coords: self.coords,
            external_place_id: blank_to_none(self.external_place_id),
            user_ratings_total: self.user_ratings_total,
            rating_updated_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Place {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(Violation::new("name", "is required"));
        } else if self.name.chars().count() > MAX_NAME_LEN {
            violations.push(Violation::new(
                "name",
                format!("must be at most {} characters", MAX_NAME_LEN),
            ));
        }

        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            violations.push(Violation::new(
                "description",
                format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
            ));
        }

        if let Some(rating) = self.rating {
            if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
                violations.push(Violation::new("rating", "must be between 0 and 5"));
            }
        }

        if self.address.chars().count() > MAX_ADDRESS_LEN {
            violations.push(Violation::new(
                "address",
                format!("must be at most {} characters", MAX_ADDRESS_LEN),
            ));
        }

        if let Some(url) = &self.url {
            if !is_absolute_url(url) {
                violations.push(Violation::new("url", "must be an absolute http(s) URL"));
            }
        }

        for (i, image) in self.images.iter().enumerate() {
            if !is_absolute_url(image) {
                violations.push(Violation::new(
                    format!("images[{}]", i),
                    "must be an absolute http(s) URL",
                ));
            }
        }

        let Coordinates { lat, lng } = self.coords;
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            violations.push(Violation::new("coords.lat", "must be between -90 and 90"));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            violations.push(Violation::new("coords.lng", "must be between -180 and 180"));
        }

        if let Some(id) = &self.external_place_id {
            if id.trim().is_empty() {
                violations.push(Violation::new("externalPlaceId", "must not be blank"));
            }
        }

        violations
    }

    /// Fails with a validation error listing every violated field.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        let violations = self.validate();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations_error(violations))
        }
    }
}

fn is_absolute_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}
