//! Normalized hourly sample bundle
//!
//! The common shape every atmospheric provider must produce: four parallel,
//! chronologically ordered series plus a provenance label.

use serde::{Deserialize, Serialize};

use crate::{Result, RiskError};

/// One hour of normalized atmospheric state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub temperature_celsius: f64,
    pub relative_humidity_percent: f64,
    pub wind_speed_kph: f64,
    pub precipitation_mm_per_hr: f64,
}

/// Parallel per-hour series for one engine invocation.
///
/// Values are expected to be NaN-free; that is the provider's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSampleBundle {
    pub temperature_celsius: Vec<f64>,
    pub relative_humidity_percent: Vec<f64>,
    /// Magnitude, already combined from vector components where the source has them.
    pub wind_speed_kph: Vec<f64>,
    pub precipitation_mm_per_hr: Vec<f64>,
    /// Provider and data regime, e.g. "Open-Meteo ERA5 (Reanalysis)"
    pub source_label: String,
}

impl NormalizedSampleBundle {
    pub fn new(source_label: impl Into<String>) -> Self {
        Self::with_capacity(source_label, 0)
    }

    pub fn with_capacity(source_label: impl Into<String>, capacity: usize) -> Self {
        Self {
            temperature_celsius: Vec::with_capacity(capacity),
            relative_humidity_percent: Vec::with_capacity(capacity),
            wind_speed_kph: Vec::with_capacity(capacity),
            precipitation_mm_per_hr: Vec::with_capacity(capacity),
            source_label: source_label.into(),
        }
    }

    pub fn from_samples<I>(source_label: impl Into<String>, samples: I) -> Self
    where
        I: IntoIterator<Item = HourlySample>,
    {
        let mut bundle = Self::new(source_label);
        for sample in samples {
            bundle.push(sample);
        }
        bundle
    }

    pub fn push(&mut self, sample: HourlySample) {
        self.temperature_celsius.push(sample.temperature_celsius);
        self.relative_humidity_percent.push(sample.relative_humidity_percent);
        self.wind_speed_kph.push(sample.wind_speed_kph);
        self.precipitation_mm_per_hr.push(sample.precipitation_mm_per_hr);
    }

    /// Sample count, taken from the temperature series.
    pub fn len(&self) -> usize {
        self.temperature_celsius.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate samples hour by hour. Stops at the shortest series.
    pub fn samples(&self) -> impl Iterator<Item = HourlySample> + '_ {
        self.temperature_celsius
            .iter()
            .zip(&self.relative_humidity_percent)
            .zip(&self.wind_speed_kph)
            .zip(&self.precipitation_mm_per_hr)
            .map(|(((t, rh), wind), precip)| HourlySample {
                temperature_celsius: *t,
                relative_humidity_percent: *rh,
                wind_speed_kph: *wind,
                precipitation_mm_per_hr: *precip,
            })
    }

    /// Check the bundle is fit for hazard computation and return `N`.
    ///
    /// Mismatched series lengths are a defect; zero samples is an empty result.
    pub fn validate(&self) -> Result<usize> {
        let n = self.temperature_celsius.len();
        let lengths = [
            ("relative_humidity_percent", self.relative_humidity_percent.len()),
            ("wind_speed_kph", self.wind_speed_kph.len()),
            ("precipitation_mm_per_hr", self.precipitation_mm_per_hr.len()),
        ];
        for (series, len) in lengths {
            if len != n {
                return Err(RiskError::InvariantViolation(format!(
                    "sample series length mismatch from {}: temperature_celsius has {n}, {series} has {len}",
                    self.source_label
                )));
            }
        }

        if n == 0 {
            return Err(RiskError::EmptyResult {
                source_label: self.source_label.clone(),
            });
        }

        Ok(n)
    }
}
