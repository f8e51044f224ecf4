//! Derived per-sample quantities
//!
//! Heat index uses a linear humidity correction:
//!
//! ```text
//! HI = T - 0.55 * (1 - RH/100) * (T - 14.6)
//! ```
//!
//! This is a simplified proxy for perceived heat, not the full Steadman/NWS
//! regression. Dry air pulls the value toward 14.6 °C; saturated air leaves
//! it equal to the air temperature.

use crate::bundle::NormalizedSampleBundle;

const HUMIDITY_DAMPING: f64 = 0.55;
const PIVOT_C: f64 = 14.6;

/// Approximate heat index (°C) for one sample.
pub fn heat_index_c(temperature_c: f64, relative_humidity_pct: f64) -> f64 {
    temperature_c - HUMIDITY_DAMPING * (1.0 - relative_humidity_pct / 100.0) * (temperature_c - PIVOT_C)
}

/// Per-sample quantities computed from a bundle, index-aligned with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub heat_index_c: Vec<f64>,
}

impl DerivedMetrics {
    pub fn compute(bundle: &NormalizedSampleBundle) -> Self {
        let heat_index_c = bundle
            .temperature_celsius
            .iter()
            .zip(&bundle.relative_humidity_percent)
            .map(|(t, rh)| heat_index_c(*t, *rh))
            .collect();

        Self { heat_index_c }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::HourlySample;

    #[test]
    fn test_mild_sample() {
        // 20 - 0.55 * 0.5 * 5.4 = 18.515
        let hi = heat_index_c(20.0, 50.0);
        assert!((hi - 18.515).abs() < 1e-9, "got {hi}");
    }

    #[test]
    fn test_saturated_air_equals_temperature() {
        assert!((heat_index_c(38.0, 100.0) - 38.0).abs() < 1e-12);
    }

    #[test]
    fn test_pivot_is_fixed_point() {
        for rh in [0.0, 30.0, 90.0] {
            assert!((heat_index_c(14.6, rh) - 14.6).abs() < 1e-12);
        }
    }

    #[test]
    fn test_compute_is_element_wise() {
        let bundle = NormalizedSampleBundle::from_samples(
            "test",
            [(20.0, 50.0), (45.0, 90.0), (10.0, 20.0)].map(|(t, rh)| HourlySample {
                temperature_celsius: t,
                relative_humidity_percent: rh,
                wind_speed_kph: 0.0,
                precipitation_mm_per_hr: 0.0,
            }),
        );

        let derived = DerivedMetrics::compute(&bundle);
        assert_eq!(derived.heat_index_c.len(), 3);
        assert!((derived.heat_index_c[1] - heat_index_c(45.0, 90.0)).abs() < 1e-12);
        assert!(derived.heat_index_c[1] > 40.0);
    }
}
