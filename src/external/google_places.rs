use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{upstream_error, Error};

const DETAILS_FIELDS: &str = "rating,user_ratings_total,url";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Rating data for a single place. Any field the provider left out, or sent
/// with the wrong type, is `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u64>,
    pub external_url: Option<String>,
}

/// Source of aggregate ratings keyed by an external place id. One call per
/// place, no retries.
#[async_trait]
pub trait RatingProvider: Send + Sync {
    async fn fetch_details(&self, external_place_id: &str, api_key: &str)
        -> Result<PlaceDetails, Error>;
}

#[derive(Clone, Debug, Deserialize)]
struct Response {
    status: String,
    error_message: Option<String>,
    result: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct GooglePlacesClient {
    client: reqwest::Client,
    details_url: String,
}

impl GooglePlacesClient {
    /// `api_base` is a host (`maps.googleapis.com`) or a full origin
    /// (`http://127.0.0.1:9000`).
    pub fn new(api_base: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let origin = if api_base.contains("://") {
            api_base.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", api_base.trim_end_matches('/'))
        };

        Ok(Self {
            client,
            details_url: format!("{}/maps/api/place/details/json", origin),
        })
    }
}

#[async_trait]
impl RatingProvider for GooglePlacesClient {
    #[tracing::instrument(skip(self, api_key))]
    async fn fetch_details(
        &self,
        external_place_id: &str,
        api_key: &str,
    ) -> Result<PlaceDetails, Error> {
        let res = self
            .client
            .get(&self.details_url)
            .query(&[("place_id", external_place_id)])
            .query(&[("fields", DETAILS_FIELDS)])
            .query(&[("key", api_key)])
            .send()
            .await?;

        let status_code = res.status();
        if !status_code.is_success() {
            return Err(upstream_error(format!(
                "Places Details HTTP {}",
                status_code.as_u16()
            )));
        }

        let data: Response = res.json().await?;

        parse_details(data)
    }
}

fn parse_details(data: Response) -> Result<PlaceDetails, Error> {
    if data.status != "OK" {
        return Err(upstream_error(format!(
            "Places status={} ({})",
            data.status,
            data.error_message.as_deref().unwrap_or("no msg")
        )));
    }

    let result = data.result.unwrap_or(Value::Null);

    Ok(PlaceDetails {
        rating: result.get("rating").and_then(Value::as_f64),
        user_ratings_total: result.get("user_ratings_total").and_then(Value::as_u64),
        external_url: result
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(String::from),
    })
}
