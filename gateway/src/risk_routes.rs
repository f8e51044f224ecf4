//! Risk assessment routes
//!
//! `GET /api/risk_by_location?location_name=..&date=YYYY-MM-DD&duration_hours=6`
//!
//! Geocodes the place, runs the engine and returns the result JSON. Every
//! failure is an `{"error": ...}` body with a status chosen by error class.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use risk_engine::{ErrorEnvelope, ProviderError, RiskEngine, RiskError, RiskRequest, RiskResult};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use weather_sources::Geocoder;

#[derive(Clone)]
pub struct RiskState {
    pub engine: Arc<RiskEngine>,
    pub geocoder: Arc<dyn Geocoder>,
}

pub fn risk_router(state: RiskState) -> Router {
    Router::new()
        .route("/risk_by_location", get(risk_by_location))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RiskQuery {
    pub location_name: String,
    pub date: String,
    pub duration_hours: Option<i64>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadQuery(String),
    #[error("Could not find coordinates for: {0}")]
    UnknownPlace(String),
    #[error("Geocoding failed: {0}")]
    Geocoder(ProviderError),
    #[error(transparent)]
    Risk(#[from] RiskError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadQuery(_) | ApiError::UnknownPlace(_) => StatusCode::BAD_REQUEST,
            ApiError::Geocoder(_) => StatusCode::BAD_GATEWAY,
            ApiError::Risk(err) => match err {
                RiskError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RiskError::ProviderUnavailable(_) | RiskError::EmptyResult { .. } => StatusCode::NOT_FOUND,
                RiskError::PartnerUnavailable(_) => StatusCode::BAD_GATEWAY,
                RiskError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self, "Request failed");
        }
        (status, Json(ErrorEnvelope::new(self.to_string()))).into_response()
    }
}

async fn risk_by_location(
    State(state): State<RiskState>,
    query: Result<Query<RiskQuery>, QueryRejection>,
) -> Result<Json<RiskResult>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadQuery(e.body_text()))?;

    let span = info_span!("risk_request", request_id = %Uuid::new_v4(), location = %query.location_name);
    assess(&state, query).instrument(span).await.map(Json)
}

async fn assess(state: &RiskState, query: RiskQuery) -> Result<RiskResult, ApiError> {
    let name = query.location_name.trim();
    if name.is_empty() {
        return Err(ApiError::BadQuery("location_name must not be empty".to_string()));
    }

    let location = state
        .geocoder
        .geocode(name)
        .await
        .map_err(ApiError::Geocoder)?
        .ok_or_else(|| ApiError::UnknownPlace(name.to_string()))?;
    info!(lat = location.latitude(), lon = location.longitude(), "Resolved location");

    let request = RiskRequest::parse(location, &query.date, query.duration_hours, state.engine.config())?;
    Ok(state.engine.assess(&request).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use risk_engine::{
        AtmosphericProvider, EngineConfig, HourlySample, Location, NormalizedSampleBundle, PartnerForecast,
        PartnerForecastSignal, SampleQuery,
    };
    use tower::ServiceExt;

    struct Gazetteer;

    #[async_trait]
    impl Geocoder for Gazetteer {
        async fn geocode(&self, name: &str) -> Result<Option<Location>, ProviderError> {
            match name {
                "Sao Paulo" => Ok(Location::new(-23.5505, -46.6333, Some(name.to_string())).ok()),
                "Oslo" => Ok(Location::new(59.91, 10.75, Some(name.to_string())).ok()),
                "Offline" => Err(ProviderError::RequestFailed("connection refused".to_string())),
                _ => Ok(None),
            }
        }
    }

    struct Canned {
        label: &'static str,
        samples: Vec<HourlySample>,
    }

    #[async_trait]
    impl AtmosphericProvider for Canned {
        fn name(&self) -> &str {
            self.label
        }

        async fn fetch(&self, _query: &SampleQuery) -> Result<NormalizedSampleBundle, ProviderError> {
            Ok(NormalizedSampleBundle::from_samples(self.label, self.samples.clone()))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl AtmosphericProvider for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn fetch(&self, _query: &SampleQuery) -> Result<NormalizedSampleBundle, ProviderError> {
            Err(ProviderError::NoData("No data found. Try a date before yesterday.".to_string()))
        }
    }

    struct DownPartner;

    #[async_trait]
    impl PartnerForecast for DownPartner {
        async fn fetch_signal(
            &self,
            _place_name: &str,
            _date: chrono::NaiveDate,
        ) -> Result<Option<PartnerForecastSignal>, ProviderError> {
            Err(ProviderError::Api("status 503".to_string()))
        }
    }

    fn hot_hours() -> Vec<HourlySample> {
        let hot = HourlySample {
            temperature_celsius: 46.0,
            relative_humidity_percent: 90.0,
            wind_speed_kph: 10.0,
            precipitation_mm_per_hr: 0.0,
        };
        let mild = HourlySample {
            temperature_celsius: 20.0,
            relative_humidity_percent: 50.0,
            wind_speed_kph: 10.0,
            precipitation_mm_per_hr: 0.0,
        };
        let mut samples = vec![hot; 4];
        samples.extend(vec![mild; 6]);
        samples
    }

    fn app_with(reanalysis: Arc<dyn AtmosphericProvider>, partner: Option<Arc<dyn PartnerForecast>>) -> Router {
        let forecast = Arc::new(Canned {
            label: "forecast",
            samples: hot_hours(),
        });
        let mut engine = RiskEngine::new(reanalysis, forecast, EngineConfig::default());
        if let Some(partner) = partner {
            engine = engine.with_partner(partner);
        }
        Router::new().nest(
            "/api",
            risk_router(RiskState {
                engine: Arc::new(engine),
                geocoder: Arc::new(Gazetteer),
            }),
        )
    }

    fn app() -> Router {
        let reanalysis = Arc::new(Canned {
            label: "Canned Reanalysis",
            samples: hot_hours(),
        });
        app_with(reanalysis, None)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_success_shape() {
        let (status, body) = get(app(), "/api/risk_by_location?location_name=Sao%20Paulo&date=2024-03-10&duration_hours=9").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query_time_window"], "2024-03-10 00:00Z to 2024-03-10 09:00Z");
        assert_eq!(body["query_location"]["name"], "Sao Paulo");
        assert_eq!(body["data_points_analyzed"], 10);
        assert_eq!(body["data_source_blended"], "Canned Reanalysis");
        assert_eq!(body["adverse_risk_likelihoods"]["very_hot"], 40.0);
        assert_eq!(body["adverse_risk_likelihoods"]["very_uncomfortable"], 24.0);
    }

    #[tokio::test]
    async fn test_unknown_place_is_400() {
        let (status, body) = get(app(), "/api/risk_by_location?location_name=Atlantis&date=2024-03-10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Could not find coordinates for: Atlantis"}));
    }

    #[tokio::test]
    async fn test_bad_date_is_400_without_partial_fields() {
        let (status, body) = get(app(), "/api/risk_by_location?location_name=Oslo&date=10/03/2024").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid date"));
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_duration_is_400() {
        let (status, _) = get(app(), "/api/risk_by_location?location_name=Oslo&date=2024-03-10&duration_hours=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_duration_is_400() {
        let (status, body) = get(
            app(),
            "/api/risk_by_location?location_name=Oslo&date=2099-01-01&duration_hours=1000000000",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("at most 720"));
    }

    #[tokio::test]
    async fn test_calendar_edge_date_is_400_not_panic() {
        let (status, body) = get(app(), "/api/risk_by_location?location_name=Oslo&date=-262143-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("outside the supported calendar"));
    }

    #[tokio::test]
    async fn test_missing_params_is_400_envelope() {
        let (status, body) = get(app(), "/api/risk_by_location?location_name=Oslo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_provider_failure_is_404() {
        let (status, body) = get(
            app_with(Arc::new(Unreachable), None),
            "/api/risk_by_location?location_name=Oslo&date=2024-03-10",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("No data found for window/location"));
    }

    #[tokio::test]
    async fn test_empty_bundle_is_404() {
        let empty = Arc::new(Canned {
            label: "Empty",
            samples: Vec::new(),
        });
        let (status, _) = get(app_with(empty, None), "/api/risk_by_location?location_name=Oslo&date=2024-03-10").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_partner_failure_is_502() {
        let reanalysis = Arc::new(Canned {
            label: "Canned Reanalysis",
            samples: hot_hours(),
        });
        let (status, _) = get(
            app_with(reanalysis, Some(Arc::new(DownPartner))),
            "/api/risk_by_location?location_name=Sao%20Paulo&date=2024-03-10",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_geocoder_outage_is_502() {
        let (status, body) = get(app(), "/api/risk_by_location?location_name=Offline&date=2024-03-10").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().starts_with("Geocoding failed"));
    }
}
