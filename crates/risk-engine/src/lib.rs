//! Event Weather Risk Engine
//!
//! Estimates how likely a planned outdoor event is to meet adverse weather
//! (extreme heat, cold, wind, precipitation and a composite "uncomfortable"
//! condition) from an hourly series of atmospheric samples.
//!
//! # Pipeline
//!
//! ```text
//! SourceSelector -> provider -> heat index -> hazard likelihoods
//!     -> partner blend (optional) -> composite score -> RiskResult
//! ```
//!
//! | Hazard     | Predicate                                   |
//! |------------|---------------------------------------------|
//! | very_hot   | heat index > 40 °C                          |
//! | very_cold  | temperature < 0 °C and wind > 20 kph        |
//! | very_windy | wind > 50 kph                               |
//! | very_wet   | precipitation > 5 mm/hr                     |
//!
//! Every invocation is a single stateless pass. The engine owns nothing
//! mutable between requests, so one [`RiskEngine`] can be shared across
//! tasks behind an `Arc`.

use thiserror::Error;

pub mod blend;
pub mod bundle;
pub mod composite;
pub mod config;
pub mod derived;
pub mod engine;
pub mod hazard;
pub mod request;
pub mod result;
pub mod source;

pub use blend::{PartnerForecast, PartnerForecastSignal};
pub use bundle::{HourlySample, NormalizedSampleBundle};
pub use config::{BlendConfig, CompositeWeights, EngineConfig, HazardThresholds, PartnerRegion, SearchConfig};
pub use engine::RiskEngine;
pub use request::{Coordinates, Location, RiskRequest, TimeWindow};
pub use result::{ErrorEnvelope, HazardLikelihoods, RiskResult};
pub use source::{AtmosphericProvider, Regime, SampleQuery, SourceSelector};

/// Failure raised by an external collaborator (data provider, partner
/// forecast, geocoder).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    NoData(String),
}

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("No data found for window/location: {0}")]
    ProviderUnavailable(#[from] ProviderError),
    #[error("No data found for window/location: {source_label} returned no samples. Try adjusting the duration or date.")]
    EmptyResult { source_label: String },
    #[error("Partner forecast unavailable: {0}")]
    PartnerUnavailable(ProviderError),
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// Coarse classification of a [`RiskError`], used by transports to pick a
/// status code and by logging to separate defects from user mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something unusable.
    Input,
    /// A collaborator failed or had nothing for the window.
    Provider,
    /// The engine itself is broken.
    Internal,
}

impl RiskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::Input,
            Self::ProviderUnavailable(_) | Self::EmptyResult { .. } | Self::PartnerUnavailable(_) => {
                ErrorKind::Provider
            }
            Self::InvariantViolation(_) => ErrorKind::Internal,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

/// Round to one decimal place, the precision every likelihood is reported at.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
