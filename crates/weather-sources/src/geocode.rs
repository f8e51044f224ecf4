//! Place name to coordinates
//!
//! API: https://nominatim.openstreetmap.org/search

use async_trait::async_trait;
use risk_engine::{Location, ProviderError};
use serde::Deserialize;
use tracing::debug;

use crate::{http_client, request_failed, DEFAULT_TIMEOUT_SEC};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "event_weather_risk_client";

/// Resolves a free-text place name. `Ok(None)` means no match.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, name: &str) -> Result<Option<Location>, ProviderError>;
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Nominatim's usage policy requires an identifying user agent.
    pub fn new(user_agent: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(user_agent, NOMINATIM_URL)
    }

    pub fn with_base_url(user_agent: &str, base_url: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(DEFAULT_TIMEOUT_SEC, Some(user_agent))?,
            base_url: base_url.to_string(),
        })
    }
}

/// First search hit as a [`Location`] named by the caller's query.
fn parse_places(body: &str, query: &str) -> Result<Option<Location>, ProviderError> {
    let places: Vec<Place> = serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let coord = |raw: &str| {
        raw.parse::<f64>()
            .map_err(|e| ProviderError::Parse(format!("bad coordinate '{}': {}", raw, e)))
    };
    let (lat, lon) = (coord(&place.lat)?, coord(&place.lon)?);
    debug!(query, lat, lon, matched = place.display_name.as_deref().unwrap_or(""), "Geocoded");

    Location::new(lat, lon, Some(query.to_string()))
        .map(Some)
        .map_err(|e| ProviderError::Parse(e.to_string()))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &str) -> Result<Option<Location>, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(request_failed)?;

        if !response.status().is_success() {
            return Err(ProviderError::Api(format!("status {}", response.status())));
        }

        let body = response.text().await.map_err(request_failed)?;
        parse_places(&body, name)
    }
}
