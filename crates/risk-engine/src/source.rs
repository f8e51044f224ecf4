//! Data source selection
//!
//! Windows starting strictly after "now" go to the forecast provider; all
//! others go to the reanalysis provider with a padded search window and a
//! small bounding box around the point. Both providers share one contract:
//! return a [`NormalizedSampleBundle`] or fail. No retries happen here.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::bundle::NormalizedSampleBundle;
use crate::config::SearchConfig;
use crate::request::{Coordinates, TimeWindow};
use crate::{ProviderError, Result, RiskError};

/// Data regime a request is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Retrospective, observation-constrained data (past/present windows)
    Reanalysis,
    /// Model prediction (future windows)
    Forecast,
}

impl Regime {
    /// Forecast only when the window starts strictly after `now`.
    pub fn for_window(window: &TimeWindow, now: DateTime<Utc>) -> Self {
        if window.start > now {
            Regime::Forecast
        } else {
            Regime::Reanalysis
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Reanalysis => write!(f, "reanalysis"),
            Regime::Forecast => write!(f, "forecast"),
        }
    }
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn around(point: Coordinates, half_width_deg: f64) -> Self {
        Self {
            min_lon: point.longitude - half_width_deg,
            min_lat: point.latitude - half_width_deg,
            max_lon: point.longitude + half_width_deg,
            max_lat: point.latitude + half_width_deg,
        }
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Extra search extent handed to reanalysis providers so sparse or irregular
/// dataset granularity still finds the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchExtent {
    pub window: TimeWindow,
    pub bbox: BoundingBox,
}

/// What a provider is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleQuery {
    pub point: Coordinates,
    /// Samples must fall inside this window (inclusive)
    pub window: TimeWindow,
    /// Present for reanalysis queries only
    pub search: Option<SearchExtent>,
}

impl SampleQuery {
    /// Window to request from the upstream dataset.
    pub fn search_window(&self) -> TimeWindow {
        self.search.map(|s| s.window).unwrap_or(self.window)
    }
}

/// Atmospheric data provider (reanalysis or forecast).
#[async_trait]
pub trait AtmosphericProvider: Send + Sync {
    /// Human-readable provider name for logs
    fn name(&self) -> &str;

    async fn fetch(&self, query: &SampleQuery) -> std::result::Result<NormalizedSampleBundle, ProviderError>;
}

/// Routes a request to the reanalysis or forecast provider.
#[derive(Clone)]
pub struct SourceSelector {
    reanalysis: Arc<dyn AtmosphericProvider>,
    forecast: Arc<dyn AtmosphericProvider>,
    search: SearchConfig,
}

impl SourceSelector {
    pub fn new(
        reanalysis: Arc<dyn AtmosphericProvider>,
        forecast: Arc<dyn AtmosphericProvider>,
        search: SearchConfig,
    ) -> Self {
        Self {
            reanalysis,
            forecast,
            search,
        }
    }

    /// Build the provider query for a regime.
    ///
    /// Fails with invalid input when the padded search window leaves the
    /// representable calendar.
    pub fn query_for(&self, regime: Regime, point: Coordinates, window: TimeWindow) -> Result<SampleQuery> {
        let search = match regime {
            Regime::Forecast => None,
            Regime::Reanalysis => {
                let padded = window.padded(self.search.margin_hours).ok_or_else(|| {
                    RiskError::InvalidInput(format!("Window {window} is outside the supported calendar"))
                })?;
                Some(SearchExtent {
                    window: padded,
                    bbox: BoundingBox::around(point, self.search.bbox_half_width_deg),
                })
            }
        };
        Ok(SampleQuery { point, window, search })
    }

    /// Pick the regime for `window` relative to `now` and fetch from it.
    ///
    /// Provider failures propagate as-is.
    pub async fn fetch(
        &self,
        point: Coordinates,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<(Regime, NormalizedSampleBundle)> {
        let regime = Regime::for_window(&window, now);
        let provider = match regime {
            Regime::Reanalysis => &self.reanalysis,
            Regime::Forecast => &self.forecast,
        };
        let query = self.query_for(regime, point, window)?;

        info!(%regime, provider = provider.name(), %window, "Fetching atmospheric samples");
        let bundle = provider.fetch(&query).await?;
        debug!(samples = bundle.len(), source = %bundle.source_label, "Provider returned bundle");

        Ok((regime, bundle))
    }
}
