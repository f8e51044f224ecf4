//! Open-Meteo providers
//!
//! Archive API (ERA5 reanalysis) for past windows and the forecast API for
//! future ones. Both request the same hourly variables in UTC with wind in
//! km/h and normalize through [`normalize_hourly`].
//!
//! API: https://archive-api.open-meteo.com/v1/archive
//! API: https://api.open-meteo.com/v1/forecast

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use risk_engine::{AtmosphericProvider, HourlySample, NormalizedSampleBundle, ProviderError, SampleQuery, TimeWindow};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{http_client, request_failed, DEFAULT_TIMEOUT_SEC};

pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub const ARCHIVE_LABEL: &str = "Open-Meteo ERA5 (Reanalysis)";
pub const FORECAST_LABEL: &str = "Open-Meteo GFS/ICON (Future Forecast)";

const HOURLY_VARIABLES: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,precipitation";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone)]
pub struct OpenMeteoConfig {
    /// Endpoint, overridable for self-hosted instances
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_sec: u64,
}

impl OpenMeteoConfig {
    pub fn archive() -> Self {
        Self {
            base_url: ARCHIVE_URL.to_string(),
            timeout_sec: DEFAULT_TIMEOUT_SEC,
        }
    }

    pub fn forecast() -> Self {
        Self {
            base_url: FORECAST_URL.to_string(),
            timeout_sec: DEFAULT_TIMEOUT_SEC,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: Hourly,
}

/// Hourly block. Variables are null where the dataset has a gap.
#[derive(Debug, Deserialize)]
struct Hourly {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

/// Shared request plumbing for both endpoints.
struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    fn new(config: OpenMeteoConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(config.timeout_sec, None)?,
            base_url: config.base_url,
        })
    }

    fn url(&self, latitude: f64, longitude: f64, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}?latitude={:.4}&longitude={:.4}&start_date={}&end_date={}&hourly={}&wind_speed_unit=kmh&timezone=UTC",
            self.base_url,
            latitude,
            longitude,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            HOURLY_VARIABLES,
        )
    }

    /// Fetch the calendar days covering `search` and return the raw body.
    async fn fetch_body(&self, query: &SampleQuery) -> Result<String, ProviderError> {
        let search = query.search_window();
        let url = self.url(
            query.point.latitude,
            query.point.longitude,
            search.start.date_naive(),
            search.end.date_naive(),
        );
        debug!(%url, "Open-Meteo request");

        let response = self.client.get(&url).send().await.map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Open-Meteo rejected request");
            return Err(ProviderError::Api(format!("status {}", status)));
        }

        response.text().await.map_err(request_failed)
    }
}

/// Parse an Open-Meteo hourly body and keep the complete hours inside
/// `window` (both endpoints inclusive).
///
/// Returns [`ProviderError::NoData`] when the upstream series is empty. A
/// series with no hours inside the window yields an empty bundle.
pub fn normalize_hourly(body: &str, window: &TimeWindow, source_label: &str) -> Result<NormalizedSampleBundle, ProviderError> {
    let response: HourlyResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let hourly = response.hourly;

    if hourly.time.is_empty() {
        return Err(ProviderError::NoData(format!(
            "No data found for {}. Try a date before {} or change location.",
            source_label,
            (Utc::now() - chrono::Duration::days(1)).format("%Y-%m-%d")
        )));
    }

    let mut bundle = NormalizedSampleBundle::with_capacity(source_label, window.duration_hours().max(0) as usize + 1);
    let mut incomplete = 0usize;

    for (i, ts) in hourly.time.iter().enumerate() {
        let instant = NaiveDateTime::parse_from_str(ts, TIME_FORMAT)
            .map_err(|e| ProviderError::Parse(format!("bad timestamp '{}': {}", ts, e)))?
            .and_utc();
        if !window.contains(instant) {
            continue;
        }

        let value = |series: &[Option<f64>]| series.get(i).copied().flatten();
        match (
            value(&hourly.temperature_2m),
            value(&hourly.relative_humidity_2m),
            value(&hourly.wind_speed_10m),
            value(&hourly.precipitation),
        ) {
            (Some(t), Some(rh), Some(wind), Some(precip)) => bundle.push(HourlySample {
                temperature_celsius: t,
                relative_humidity_percent: rh,
                wind_speed_kph: wind,
                precipitation_mm_per_hr: precip,
            }),
            _ => incomplete += 1,
        }
    }

    if incomplete > 0 {
        debug!(incomplete, "Dropped hours with missing variables");
    }
    Ok(bundle)
}

/// ERA5 reanalysis through the Open-Meteo archive.
///
/// The archive is point-based, so the query's bounding box collapses to its
/// center; the padded search window selects the calendar days fetched.
pub struct OpenMeteoArchiveProvider {
    inner: OpenMeteoClient,
}

impl OpenMeteoArchiveProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(OpenMeteoConfig::archive())
    }

    pub fn with_config(config: OpenMeteoConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            inner: OpenMeteoClient::new(config)?,
        })
    }
}

#[async_trait]
impl AtmosphericProvider for OpenMeteoArchiveProvider {
    fn name(&self) -> &str {
        ARCHIVE_LABEL
    }

    async fn fetch(&self, query: &SampleQuery) -> Result<NormalizedSampleBundle, ProviderError> {
        let body = self.inner.fetch_body(query).await?;
        normalize_hourly(&body, &query.window, ARCHIVE_LABEL)
    }
}

/// Model forecast through the Open-Meteo forecast API.
pub struct OpenMeteoForecastProvider {
    inner: OpenMeteoClient,
}

impl OpenMeteoForecastProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(OpenMeteoConfig::forecast())
    }

    pub fn with_config(config: OpenMeteoConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            inner: OpenMeteoClient::new(config)?,
        })
    }
}

#[async_trait]
impl AtmosphericProvider for OpenMeteoForecastProvider {
    fn name(&self) -> &str {
        FORECAST_LABEL
    }

    async fn fetch(&self, query: &SampleQuery) -> Result<NormalizedSampleBundle, ProviderError> {
        let body = self.inner.fetch_body(query).await?;
        normalize_hourly(&body, &query.window, FORECAST_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window(hours: i64) -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 22, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::hours(hours))
    }

    const BODY: &str = r#"{
        "latitude": -23.5,
        "longitude": -46.625,
        "hourly_units": {"time": "iso8601", "wind_speed_10m": "km/h"},
        "hourly": {
            "time": ["2024-03-10T21:00", "2024-03-10T22:00", "2024-03-10T23:00", "2024-03-11T00:00", "2024-03-11T01:00"],
            "temperature_2m": [24.0, 23.5, 22.8, null, 21.9],
            "relative_humidity_2m": [70, 72, 75, 78, 80],
            "wind_speed_10m": [8.2, 7.9, 6.5, 6.0, 5.1],
            "precipitation": [0.0, 0.0, 0.4, 0.0, 6.2]
        }
    }"#;

    #[test]
    fn test_slices_window_inclusive_and_drops_gaps() {
        let bundle = normalize_hourly(BODY, &window(3), ARCHIVE_LABEL).unwrap();

        // 22:00, 23:00, (00:00 has a null), 01:00
        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.temperature_celsius, vec![23.5, 22.8, 21.9]);
        assert_eq!(bundle.precipitation_mm_per_hr, vec![0.0, 0.4, 6.2]);
        assert_eq!(bundle.source_label, ARCHIVE_LABEL);
        assert!(bundle.validate().is_ok());
    }

    #[test]
    fn test_window_outside_series_is_empty_bundle() {
        let start = Utc.with_ymd_and_hms(2024, 3, 12, 0, 0, 0).unwrap();
        let later = TimeWindow::new(start, start + Duration::hours(6));
        let bundle = normalize_hourly(BODY, &later, ARCHIVE_LABEL).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let body = r#"{"hourly": {"time": []}}"#;
        let err = normalize_hourly(body, &window(6), ARCHIVE_LABEL).unwrap_err();
        match err {
            ProviderError::NoData(msg) => assert!(msg.contains("Try a date before")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_variable_column_drops_every_hour() {
        let body = r#"{"hourly": {"time": ["2024-03-10T22:00"], "temperature_2m": [20.0]}}"#;
        let bundle = normalize_hourly(body, &window(6), FORECAST_LABEL).unwrap();
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        assert!(matches!(
            normalize_hourly("<html>", &window(6), ARCHIVE_LABEL),
            Err(ProviderError::Parse(_))
        ));
        let body = r#"{"hourly": {"time": ["yesterday"]}}"#;
        assert!(matches!(
            normalize_hourly(body, &window(6), ARCHIVE_LABEL),
            Err(ProviderError::Parse(_))
        ));
    }

    #[test]
    fn test_url_uses_padded_calendar_days() {
        let client = OpenMeteoClient::new(OpenMeteoConfig::archive()).unwrap();
        let url = client.url(
            -23.5505,
            -46.6333,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
        );
        assert!(url.starts_with(ARCHIVE_URL));
        assert!(url.contains("latitude=-23.5505&longitude=-46.6333"));
        assert!(url.contains("start_date=2024-03-09&end_date=2024-03-12"));
        assert!(url.contains("wind_speed_unit=kmh"));
        assert!(url.ends_with("timezone=UTC"));
    }
}
