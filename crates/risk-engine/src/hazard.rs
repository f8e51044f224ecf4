//! Hazard exceedance likelihoods
//!
//! Each likelihood is the share of samples whose predicate holds:
//! `100 * count / N`, rounded to one decimal. `N = 0` never reaches this
//! module; the bundle is validated first.

use crate::bundle::NormalizedSampleBundle;
use crate::config::HazardThresholds;
use crate::derived::DerivedMetrics;
use crate::round_to_tenth;

/// The four threshold-driven likelihoods, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryLikelihoods {
    pub very_hot: f64,
    pub very_cold: f64,
    pub very_windy: f64,
    pub very_wet: f64,
}

impl PrimaryLikelihoods {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("very_hot", self.very_hot),
            ("very_cold", self.very_cold),
            ("very_windy", self.very_windy),
            ("very_wet", self.very_wet),
        ]
        .into_iter()
    }
}

/// `100 * count / n` rounded to one decimal. `n` must be positive.
pub fn exceedance_pct(count: usize, n: usize) -> f64 {
    round_to_tenth(count as f64 / n as f64 * 100.0)
}

fn share<I>(flags: I, n: usize) -> f64
where
    I: IntoIterator<Item = bool>,
{
    exceedance_pct(flags.into_iter().filter(|hit| *hit).count(), n)
}

/// Compute the four primary likelihoods over a validated bundle.
pub fn compute(
    bundle: &NormalizedSampleBundle,
    derived: &DerivedMetrics,
    thresholds: &HazardThresholds,
) -> PrimaryLikelihoods {
    let n = bundle.len();

    let very_hot = share(
        derived.heat_index_c.iter().map(|hi| *hi > thresholds.hot_heat_index_c),
        n,
    );

    let very_cold = share(
        bundle
            .temperature_celsius
            .iter()
            .zip(&bundle.wind_speed_kph)
            .map(|(t, wind)| *t < thresholds.cold_temperature_c && *wind > thresholds.cold_wind_gate_kph),
        n,
    );

    let very_windy = share(bundle.wind_speed_kph.iter().map(|w| *w > thresholds.windy_kph), n);

    let very_wet = share(
        bundle.precipitation_mm_per_hr.iter().map(|p| *p > thresholds.wet_mm_per_hr),
        n,
    );

    PrimaryLikelihoods {
        very_hot,
        very_cold,
        very_windy,
        very_wet,
    }
}
