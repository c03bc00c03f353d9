use serde::{Deserialize, Serialize};

use crate::error::{PlacesError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// One business from a nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vicinity: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub price_level: Option<u8>,
}

/// Every Google web-service body carries a `status` string alongside the payload.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl StatusEnvelope {
    /// `OK` and `ZERO_RESULTS` are both successful answers.
    pub fn check(&self) -> Result<()> {
        match self.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => Err(PlacesError::Rejected {
                status: other.to_string(),
                message: self.error_message.clone().unwrap_or_default(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(flatten)]
    pub envelope: StatusEnvelope,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbyResponse {
    #[serde(flatten)]
    pub envelope: StatusEnvelope,
    #[serde(default)]
    pub results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailsResponse {
    #[serde(flatten)]
    pub envelope: StatusEnvelope,
    #[serde(default)]
    pub result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaceDetails {
    #[serde(default)]
    pub website: Option<String>,
}
