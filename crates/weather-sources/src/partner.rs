//! Keyword-table partner forecast

use async_trait::async_trait;
use chrono::NaiveDate;
use risk_engine::{PartnerForecast, PartnerForecastSignal, ProviderError};
use tracing::debug;

pub const CPTEC_MOCK_LABEL: &str = "CPTEC/INPE (MOCK Forecast)";

/// Returns a fixed signal for any place whose name contains one of the
/// table's keywords (case-insensitive). Other places get no signal.
#[derive(Debug, Clone)]
pub struct StaticPartnerForecast {
    entries: Vec<(String, PartnerForecastSignal)>,
}

impl StaticPartnerForecast {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Brazilian places answered with a mild 30 °C / 40 kph day.
    pub fn cptec_mock() -> Self {
        let signal = PartnerForecastSignal {
            max_temperature_celsius: 30.0,
            max_wind_speed_kph: 40.0,
            source_label: CPTEC_MOCK_LABEL.to_string(),
        };
        ["brasil", "sao paulo", "rio de janeiro"]
            .into_iter()
            .fold(Self::new(), |table, keyword| table.with_entry(keyword, signal.clone()))
    }

    pub fn with_entry(mut self, keyword: &str, signal: PartnerForecastSignal) -> Self {
        self.entries.push((keyword.to_lowercase(), signal));
        self
    }

    pub fn lookup(&self, place_name: &str) -> Option<&PartnerForecastSignal> {
        let name = place_name.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| name.contains(keyword.as_str()))
            .map(|(_, signal)| signal)
    }
}

impl Default for StaticPartnerForecast {
    fn default() -> Self {
        Self::cptec_mock()
    }
}

#[async_trait]
impl PartnerForecast for StaticPartnerForecast {
    async fn fetch_signal(
        &self,
        place_name: &str,
        date: NaiveDate,
    ) -> Result<Option<PartnerForecastSignal>, ProviderError> {
        let signal = self.lookup(place_name).cloned();
        debug!(place_name, %date, matched = signal.is_some(), "Partner table lookup");
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_mock_matches_brazilian_places() {
        let partner = StaticPartnerForecast::cptec_mock();
        for place in ["Sao Paulo, Brasil", "RIO DE JANEIRO", "Brasilia, Brasil"] {
            let signal = partner.fetch_signal(place, date()).await.unwrap().unwrap();
            assert_eq!(signal.max_temperature_celsius, 30.0);
            assert_eq!(signal.max_wind_speed_kph, 40.0);
            assert_eq!(signal.source_label, CPTEC_MOCK_LABEL);
        }
    }

    #[tokio::test]
    async fn test_unknown_place_has_no_signal() {
        let partner = StaticPartnerForecast::cptec_mock();
        assert_eq!(partner.fetch_signal("Buenos Aires", date()).await.unwrap(), None);
    }

    #[test]
    fn test_custom_entry() {
        let table = StaticPartnerForecast::new().with_entry(
            "Manaus",
            PartnerForecastSignal {
                max_temperature_celsius: 38.0,
                max_wind_speed_kph: 12.0,
                source_label: "Regional".to_string(),
            },
        );
        assert_eq!(table.lookup("manaus, amazonas").map(|s| s.max_temperature_celsius), Some(38.0));
        assert!(table.lookup("Sao Paulo").is_none());
    }
}
