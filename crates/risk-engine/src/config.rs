//! Engine configuration
//!
//! Domain constants live here as named, overridable values so thresholds and
//! blend bonuses can be tuned without touching calculator logic.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Result, RiskError};

/// Heat index above which an hour counts as very hot (°C)
pub const HOT_HEAT_INDEX_C: f64 = 40.0;
/// Temperature below which an hour can count as very cold (°C)
pub const COLD_TEMPERATURE_C: f64 = 0.0;
/// Wind needed alongside sub-zero temperature for a very cold hour (kph)
pub const COLD_WIND_GATE_KPH: f64 = 20.0;
/// Wind above which an hour counts as very windy (kph)
pub const WINDY_KPH: f64 = 50.0;
/// Precipitation above which an hour counts as very wet (mm/hr)
pub const WET_MM_PER_HR: f64 = 5.0;

/// Partner maximum temperature that triggers the hot bonus (°C)
pub const PARTNER_HOT_TRIGGER_C: f64 = 35.0;
/// Points added to very_hot on a hot partner signal
pub const PARTNER_HOT_BONUS_PCT: f64 = 20.0;
/// Partner maximum wind that triggers the windy bonus (kph)
pub const PARTNER_WINDY_TRIGGER_KPH: f64 = 55.0;
/// Points added to very_windy on a windy partner signal
pub const PARTNER_WINDY_BONUS_PCT: f64 = 30.0;

/// Composite weights. Sum = 1.0
pub const W_THERMAL: f64 = 0.6;
pub const W_WET: f64 = 0.2;
pub const W_WINDY: f64 = 0.2;

/// Reanalysis search padding on each side of the window (hours)
pub const SEARCH_MARGIN_HOURS: i64 = 24;
/// Half width of the reanalysis search box around the point (degrees)
pub const SEARCH_BBOX_HALF_WIDTH_DEG: f64 = 0.05;
/// Largest search padding a config may request (hours)
pub const MAX_SEARCH_MARGIN_HOURS: i64 = 720;

pub const DEFAULT_DURATION_HOURS: u32 = 6;
/// Hard ceiling on event duration (30 days)
pub const MAX_DURATION_HOURS: u32 = 720;

/// Fixed predicate thresholds for the four primary hazards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardThresholds {
    pub hot_heat_index_c: f64,
    pub cold_temperature_c: f64,
    pub cold_wind_gate_kph: f64,
    pub windy_kph: f64,
    pub wet_mm_per_hr: f64,
}

impl Default for HazardThresholds {
    fn default() -> Self {
        Self {
            hot_heat_index_c: HOT_HEAT_INDEX_C,
            cold_temperature_c: COLD_TEMPERATURE_C,
            cold_wind_gate_kph: COLD_WIND_GATE_KPH,
            windy_kph: WINDY_KPH,
            wet_mm_per_hr: WET_MM_PER_HR,
        }
    }
}

/// Geographic box where the partner forecast is consulted (inclusive bounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRegion {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl PartnerRegion {
    /// South America, the CPTEC/INPE coverage area.
    pub fn south_america() -> Self {
        Self {
            lat_min: -56.0,
            lat_max: 15.0,
            lon_min: -82.0,
            lon_max: -35.0,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lon_min..=self.lon_max).contains(&longitude)
    }
}

impl Default for PartnerRegion {
    fn default() -> Self {
        Self::south_america()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub region: PartnerRegion,
    pub hot_trigger_c: f64,
    pub hot_bonus_pct: f64,
    pub windy_trigger_kph: f64,
    pub windy_bonus_pct: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            region: PartnerRegion::default(),
            hot_trigger_c: PARTNER_HOT_TRIGGER_C,
            hot_bonus_pct: PARTNER_HOT_BONUS_PCT,
            windy_trigger_kph: PARTNER_WINDY_TRIGGER_KPH,
            windy_bonus_pct: PARTNER_WINDY_BONUS_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    /// Applied to max(very_hot, very_cold)
    pub thermal: f64,
    pub wet: f64,
    pub windy: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            thermal: W_THERMAL,
            wet: W_WET,
            windy: W_WINDY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub margin_hours: i64,
    pub bbox_half_width_deg: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            margin_hours: SEARCH_MARGIN_HOURS,
            bbox_half_width_deg: SEARCH_BBOX_HALF_WIDTH_DEG,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: HazardThresholds,
    pub blend: BlendConfig,
    pub composite: CompositeWeights,
    pub search: SearchConfig,
    /// Applied when a request leaves the duration out
    pub default_duration_hours: u32,
    /// Longer requests are rejected; never above [`MAX_DURATION_HOURS`]
    pub max_duration_hours: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: HazardThresholds::default(),
            blend: BlendConfig::default(),
            composite: CompositeWeights::default(),
            search: SearchConfig::default(),
            default_duration_hours: DEFAULT_DURATION_HOURS,
            max_duration_hours: MAX_DURATION_HOURS,
        }
    }
}

impl EngineConfig {
    /// Load overrides from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading engine config from {:?}", path);

        let file = File::open(path)
            .map_err(|e| RiskError::InvalidInput(format!("Cannot open config {}: {e}", path.display())))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| RiskError::InvalidInput(format!("Invalid config {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break the percentage range guarantees.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.composite.thermal, self.composite.wet, self.composite.windy];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RiskError::InvalidInput(
                "Composite weights must be finite and non-negative".to_string(),
            ));
        }
        if self.blend.hot_bonus_pct < 0.0 || self.blend.windy_bonus_pct < 0.0 {
            return Err(RiskError::InvalidInput("Blend bonuses must be non-negative".to_string()));
        }
        if self.search.margin_hours < 0 || !(self.search.bbox_half_width_deg >= 0.0) {
            return Err(RiskError::InvalidInput("Search margin and box must be non-negative".to_string()));
        }
        if self.search.margin_hours > MAX_SEARCH_MARGIN_HOURS {
            return Err(RiskError::InvalidInput(format!(
                "Search margin must be at most {MAX_SEARCH_MARGIN_HOURS} hours"
            )));
        }
        if self.max_duration_hours == 0 || self.max_duration_hours > MAX_DURATION_HOURS {
            return Err(RiskError::InvalidInput(format!(
                "Maximum duration must be between 1 and {MAX_DURATION_HOURS} hours"
            )));
        }
        if self.default_duration_hours == 0 || self.default_duration_hours > self.max_duration_hours {
            return Err(RiskError::InvalidInput(
                "Default duration must be positive and within the maximum".to_string(),
            ));
        }
        Ok(())
    }
}
