//! Result assembly and response shapes

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::hazard::PrimaryLikelihoods;
use crate::request::{Location, TimeWindow};
use crate::{Result, RiskError};

/// Five adverse-condition likelihoods, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardLikelihoods {
    pub very_hot: f64,
    pub very_cold: f64,
    pub very_windy: f64,
    pub very_wet: f64,
    pub very_uncomfortable: f64,
}

impl HazardLikelihoods {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("very_hot", self.very_hot),
            ("very_cold", self.very_cold),
            ("very_windy", self.very_windy),
            ("very_wet", self.very_wet),
            ("very_uncomfortable", self.very_uncomfortable),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&Location> for QueryLocation {
    fn from(location: &Location) -> Self {
        Self {
            latitude: location.latitude(),
            longitude: location.longitude(),
            name: location.name.clone(),
        }
    }
}

/// Engine output for one request. Serializes to the public response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    #[serde(rename = "query_time_window")]
    pub window: TimeWindow,
    #[serde(rename = "query_location")]
    pub location: QueryLocation,
    #[serde(rename = "data_points_analyzed")]
    pub sample_count: usize,
    /// Primary provider label, or the partner's when blending occurred
    #[serde(rename = "data_source_blended")]
    pub source_label: String,
    #[serde(rename = "adverse_risk_likelihoods")]
    pub likelihoods: HazardLikelihoods,
}

/// Failure response body. No partial result fields ever accompany it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

impl From<&RiskError> for ErrorEnvelope {
    fn from(err: &RiskError) -> Self {
        Self::new(err.to_string())
    }
}

/// Package computed values into a [`RiskResult`].
///
/// Any likelihood outside `[0, 100]` (or non-finite) means a calculator is
/// broken; that is reported as an invariant violation, never clamped.
pub fn assemble(
    window: TimeWindow,
    location: &Location,
    sample_count: usize,
    source_label: String,
    blended: PrimaryLikelihoods,
    very_uncomfortable: f64,
) -> Result<RiskResult> {
    let likelihoods = HazardLikelihoods {
        very_hot: blended.very_hot,
        very_cold: blended.very_cold,
        very_windy: blended.very_windy,
        very_wet: blended.very_wet,
        very_uncomfortable,
    };

    for (hazard, value) in likelihoods.named() {
        if !(0.0..=100.0).contains(&value) {
            error!(
                target: "risk_engine::invariant",
                hazard,
                value,
                source = %source_label,
                "Likelihood outside [0, 100]"
            );
            return Err(RiskError::InvariantViolation(format!(
                "{hazard} likelihood {value} outside [0, 100]"
            )));
        }
    }

    Ok(RiskResult {
        window,
        location: QueryLocation::from(location),
        sample_count,
        source_label,
        likelihoods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::hours(6))
    }

    fn primary(hot: f64) -> PrimaryLikelihoods {
        PrimaryLikelihoods {
            very_hot: hot,
            very_cold: 0.0,
            very_windy: 14.3,
            very_wet: 0.0,
        }
    }

    #[test]
    fn test_serializes_to_response_shape() {
        let location = Location::new(-23.5505, -46.6333, Some("Sao Paulo, Brasil".to_string())).unwrap();
        let result = assemble(window(), &location, 7, "Open-Meteo ERA5 (Reanalysis)".into(), primary(42.9), 28.6).unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "query_time_window": "2024-03-10 00:00Z to 2024-03-10 06:00Z",
                "query_location": {"latitude": -23.5505, "longitude": -46.6333, "name": "Sao Paulo, Brasil"},
                "data_points_analyzed": 7,
                "data_source_blended": "Open-Meteo ERA5 (Reanalysis)",
                "adverse_risk_likelihoods": {
                    "very_hot": 42.9,
                    "very_cold": 0.0,
                    "very_windy": 14.3,
                    "very_wet": 0.0,
                    "very_uncomfortable": 28.6
                }
            })
        );
    }

    #[test]
    fn test_unnamed_location_omits_name() {
        let location = Location::new(10.0, 20.0, None).unwrap();
        let result = assemble(window(), &location, 1, "x".into(), primary(0.0), 0.0).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["query_location"].get("name").is_none());
    }

    #[test]
    fn test_out_of_range_is_invariant_violation() {
        let location = Location::new(10.0, 20.0, None).unwrap();
        let err = assemble(window(), &location, 1, "x".into(), primary(100.1), 0.0).unwrap_err();
        assert!(err.is_internal());
        assert!(err.to_string().contains("very_hot"));

        let err = assemble(window(), &location, 1, "x".into(), primary(0.0), -0.1).unwrap_err();
        assert!(err.to_string().contains("very_uncomfortable"));

        let err = assemble(window(), &location, 1, "x".into(), primary(f64::NAN), 0.0).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = RiskError::InvalidInput("Invalid date 'x'".into());
        let json = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Invalid date 'x'"}));
    }
}
