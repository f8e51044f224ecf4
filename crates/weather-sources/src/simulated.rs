//! Simulated forecast for demos and offline runs
//!
//! Per hour: temperature 26 ± 2 °C, humidity 60 ± 10 %, wind 10 ± 5 kph,
//! and a 10 % chance of light rain (0.1 to 4 mm/hr). All draws are uniform.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use risk_engine::config::MAX_DURATION_HOURS;
use risk_engine::{AtmosphericProvider, HourlySample, NormalizedSampleBundle, ProviderError, SampleQuery};

pub const SIMULATED_LABEL: &str = "NOAA GFS Model (Future Forecast - *Simulated* for Demo)";

const RAIN_CHANCE: f64 = 0.1;

pub struct SimulatedForecastProvider {
    rng: Mutex<StdRng>,
}

impl SimulatedForecastProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn sample(rng: &mut StdRng) -> HourlySample {
        let precipitation = if rng.gen::<f64>() < RAIN_CHANCE {
            rng.gen_range(0.1..4.0)
        } else {
            0.0
        };
        HourlySample {
            temperature_celsius: 26.0 + rng.gen_range(-2.0..2.0),
            relative_humidity_percent: 60.0 + rng.gen_range(-10.0..10.0),
            wind_speed_kph: 10.0 + rng.gen_range(-5.0..5.0),
            precipitation_mm_per_hr: precipitation,
        }
    }
}

impl Default for SimulatedForecastProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AtmosphericProvider for SimulatedForecastProvider {
    fn name(&self) -> &str {
        SIMULATED_LABEL
    }

    /// One sample per requested hour, up to [`MAX_DURATION_HOURS`].
    async fn fetch(&self, query: &SampleQuery) -> Result<NormalizedSampleBundle, ProviderError> {
        let hours = query.window.duration_hours().max(0);
        if hours > i64::from(MAX_DURATION_HOURS) {
            return Err(ProviderError::Api(format!(
                "forecast horizon is {MAX_DURATION_HOURS} hours, window spans {hours}"
            )));
        }
        let hours = hours as usize;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ProviderError::RequestFailed("simulated generator poisoned".to_string()))?;

        let mut bundle = NormalizedSampleBundle::with_capacity(SIMULATED_LABEL, hours);
        for _ in 0..hours {
            bundle.push(Self::sample(&mut rng));
        }
        Ok(bundle)
    }
}
