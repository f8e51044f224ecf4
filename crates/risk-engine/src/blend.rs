//! Secondary-source blending
//!
//! For reanalysis requests with a place name inside the partner region, a
//! regional partner forecast may raise `very_hot` and `very_windy`. Blending
//! only ever adds, and always caps at 100. No signal means no change.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BlendConfig;
use crate::hazard::PrimaryLikelihoods;
use crate::request::Location;
use crate::source::Regime;
use crate::ProviderError;

/// Daily extremes reported by the partner forecast for one place and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerForecastSignal {
    pub max_temperature_celsius: f64,
    pub max_wind_speed_kph: f64,
    pub source_label: String,
}

/// Regional partner forecast, keyed by place name and date.
///
/// `Ok(None)` means the partner has nothing for that place; it is not an error.
#[async_trait]
pub trait PartnerForecast: Send + Sync {
    async fn fetch_signal(
        &self,
        place_name: &str,
        date: NaiveDate,
    ) -> Result<Option<PartnerForecastSignal>, ProviderError>;
}

/// Whether the partner should be consulted at all.
///
/// Returns the place name to key the lookup on.
pub fn eligible_place<'a>(regime: Regime, location: &'a Location, config: &BlendConfig) -> Option<&'a str> {
    if regime != Regime::Reanalysis {
        return None;
    }
    let name = location.name.as_deref()?;
    config
        .region
        .contains(location.latitude(), location.longitude())
        .then_some(name)
}

fn bump(value: f64, bonus: f64) -> f64 {
    (value + bonus).min(100.0)
}

/// Apply a partner signal to the primary likelihoods.
pub fn apply(
    primary: PrimaryLikelihoods,
    signal: Option<&PartnerForecastSignal>,
    config: &BlendConfig,
) -> PrimaryLikelihoods {
    let Some(signal) = signal else {
        return primary;
    };

    let mut blended = primary;
    if signal.max_temperature_celsius > config.hot_trigger_c {
        blended.very_hot = bump(blended.very_hot, config.hot_bonus_pct);
    }
    if signal.max_wind_speed_kph > config.windy_trigger_kph {
        blended.very_windy = bump(blended.very_windy, config.windy_bonus_pct);
    }

    debug!(
        partner = %signal.source_label,
        very_hot = blended.very_hot,
        very_windy = blended.very_windy,
        "Blended partner signal"
    );
    blended
}
