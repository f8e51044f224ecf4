//! Gateway settings from the environment

use std::path::PathBuf;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use weather_sources::geocode::DEFAULT_USER_AGENT;
use weather_sources::ForecastMode;

pub const DEFAULT_PORT: &str = "8000";

/// Local front-ends the API has historically been called from.
pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://127.0.0.1:5500",
    "http://localhost:8000",
    "http://localhost:8501",
    "null",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: String,
    pub engine_config: Option<PathBuf>,
    pub forecast_mode: ForecastMode,
    pub geocoder_user_agent: String,
    pub cors_origins: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let forecast_mode = match get("RISK_FORECAST_MODE") {
            Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
            None => ForecastMode::default(),
        };

        let cors_origins = match get("RISK_CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            port: get("RISK_GATEWAY_PORT")
                .or_else(|| get("PORT"))
                .unwrap_or_else(|| DEFAULT_PORT.to_string()),
            engine_config: get("RISK_ENGINE_CONFIG").map(PathBuf::from),
            forecast_mode,
            geocoder_user_agent: get("GEOCODER_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            cors_origins,
        })
    }

    /// CORS restricted to the configured origins, GET only.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) if origin != "*" => Some(value),
                _ => {
                    tracing::warn!(%origin, "Ignoring unusable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET])
            .allow_headers(Any)
    }
}
