pub mod error;
pub mod types;

pub use error::{PlacesError, Result};
pub use types::{LatLng, Place};

use serde::de::DeserializeOwned;
use types::{DetailsResponse, GeocodeResponse, NearbyResponse};

const BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Search radius around each ZIP centroid, in meters.
pub const DEFAULT_RADIUS_METERS: u32 = 5000;

pub struct PlacesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Resolve a ZIP code to the centroid of its first geocoding result.
    /// `Ok(None)` when the geocoder knows nothing about it.
    pub async fn geocode_zip(&self, zip: &str) -> Result<Option<LatLng>> {
        let url = format!("{}/geocode/json", self.base_url);
        let body: GeocodeResponse = self
            .get_json(&url, &[("address", zip), ("key", self.api_key.as_str())])
            .await?;
        parse_geocode(body)
    }

    /// Restaurants within `radius_m` of `at` matching the joined keywords.
    pub async fn nearby_restaurants(
        &self,
        at: LatLng,
        keywords: &[String],
        radius_m: u32,
    ) -> Result<Vec<Place>> {
        let url = format!("{}/place/nearbysearch/json", self.base_url);
        let location = at.to_string();
        let radius = radius_m.to_string();
        let keyword = keywords.join(" ");

        let mut query: Vec<(&str, &str)> = vec![
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("type", "restaurant"),
        ];
        if !keyword.is_empty() {
            query.push(("keyword", keyword.as_str()));
        }
        query.push(("key", self.api_key.as_str()));

        let body: NearbyResponse = self.get_json(&url, &query).await?;
        body.envelope.check()?;
        tracing::debug!(location = %at, count = body.results.len(), "Nearby search returned");
        Ok(body.results)
    }

    /// Website listed on a place's details record, if any.
    pub async fn website(&self, place_id: &str) -> Result<Option<String>> {
        let url = format!("{}/place/details/json", self.base_url);
        let body: DetailsResponse = self
            .get_json(
                &url,
                &[
                    ("place_id", place_id),
                    ("fields", "website"),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;
        body.envelope.check()?;
        Ok(body
            .result
            .and_then(|r| r.website)
            .filter(|w| !w.trim().is_empty()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlacesError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn parse_geocode(body: GeocodeResponse) -> Result<Option<LatLng>> {
    body.envelope.check()?;
    Ok(body.results.into_iter().next().map(|r| r.geometry.location))
}

/// Decode a geocoding body without issuing a request.
pub fn decode_geocode(json: &str) -> Result<Option<LatLng>> {
    parse_geocode(serde_json::from_str(json)?)
}

/// Decode a nearby-search body without issuing a request.
pub fn decode_nearby(json: &str) -> Result<Vec<Place>> {
    let body: NearbyResponse = serde_json::from_str(json)?;
    body.envelope.check()?;
    Ok(body.results)
}
