//! Weather Sources
//!
//! Concrete collaborators for the risk engine:
//!
//! - [`OpenMeteoArchiveProvider`]: ERA5 reanalysis via the Open-Meteo archive API
//! - [`OpenMeteoForecastProvider`]: model forecast via the Open-Meteo forecast API
//! - [`SimulatedForecastProvider`]: seeded demo forecast, no network
//! - [`StaticPartnerForecast`]: keyword-table regional partner forecast
//! - [`NominatimGeocoder`]: place name to coordinates via OpenStreetMap
//!
//! All HTTP traffic goes through `reqwest` with a per-client timeout. Failures
//! surface as [`risk_engine::ProviderError`]; nothing here retries.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use risk_engine::{AtmosphericProvider, ProviderError};

pub mod geocode;
pub mod open_meteo;
pub mod partner;
pub mod simulated;

pub use geocode::{Geocoder, NominatimGeocoder};
pub use open_meteo::{OpenMeteoArchiveProvider, OpenMeteoConfig, OpenMeteoForecastProvider};
pub use partner::StaticPartnerForecast;
pub use simulated::SimulatedForecastProvider;

/// Default timeout for outbound HTTP requests
pub const DEFAULT_TIMEOUT_SEC: u64 = 30;

/// Build an HTTP client with a request timeout and optional user agent.
pub(crate) fn http_client(timeout_sec: u64, user_agent: Option<&str>) -> Result<reqwest::Client, ProviderError> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_sec));
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    builder
        .build()
        .map_err(|e| ProviderError::RequestFailed(format!("Failed to create HTTP client: {}", e)))
}

/// Map a `reqwest` transport failure.
pub(crate) fn request_failed(e: reqwest::Error) -> ProviderError {
    ProviderError::RequestFailed(e.to_string())
}

/// Which forecast provider serves future windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastMode {
    #[default]
    Simulated,
    OpenMeteo,
}

impl ForecastMode {
    pub fn build(self) -> Result<Arc<dyn AtmosphericProvider>, ProviderError> {
        Ok(match self {
            ForecastMode::Simulated => Arc::new(SimulatedForecastProvider::new()),
            ForecastMode::OpenMeteo => Arc::new(OpenMeteoForecastProvider::new()?),
        })
    }
}

impl FromStr for ForecastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" => Ok(ForecastMode::Simulated),
            "open-meteo" | "openmeteo" => Ok(ForecastMode::OpenMeteo),
            other => Err(format!("unknown forecast mode '{}' (expected simulated or open-meteo)", other)),
        }
    }
}

impl fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastMode::Simulated => write!(f, "simulated"),
            ForecastMode::OpenMeteo => write!(f, "open-meteo"),
        }
    }
}
