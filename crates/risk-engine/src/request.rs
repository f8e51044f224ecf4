//! Request types and input validation

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Serialize, Serializer};

use crate::config::{EngineConfig, MAX_DURATION_HOURS};
use crate::{Result, RiskError};

/// Validate latitude is in valid range
fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is in valid range
fn is_valid_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && lon.is_finite()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !is_valid_latitude(latitude) {
            return Err(RiskError::InvalidInput(format!("Invalid latitude: {latitude}")));
        }
        if !is_valid_longitude(longitude) {
            return Err(RiskError::InvalidInput(format!("Invalid longitude: {longitude}")));
        }
        Ok(Self { latitude, longitude })
    }
}

/// Resolved event location: coordinates plus the name the user typed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub coordinates: Coordinates,
    pub name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, name: Option<String>) -> Result<Self> {
        Ok(Self {
            coordinates: Coordinates::new(latitude, longitude)?,
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }
}

/// Closed UTC interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Widen symmetrically by `hours` on each side.
    ///
    /// `None` when either edge falls outside the representable calendar.
    pub fn padded(&self, hours: i64) -> Option<Self> {
        let margin = Duration::try_hours(hours)?;
        Some(Self {
            start: self.start.checked_sub_signed(margin)?,
            end: self.end.checked_add_signed(margin)?,
        })
    }

    /// Inclusive of both endpoints.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn duration_hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Z to {}Z",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

impl Serialize for TimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One event to assess.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRequest {
    pub location: Location,
    /// UTC calendar date; the window starts at 00:00Z
    pub date: NaiveDate,
    pub duration_hours: u32,
    window: TimeWindow,
}

impl RiskRequest {
    /// Durations above [`MAX_DURATION_HOURS`] are rejected.
    pub fn new(location: Location, date: NaiveDate, duration_hours: u32) -> Result<Self> {
        if duration_hours == 0 {
            return Err(RiskError::InvalidInput(
                "duration_hours must be a positive integer".to_string(),
            ));
        }
        if duration_hours > MAX_DURATION_HOURS {
            return Err(RiskError::InvalidInput(format!(
                "duration_hours must be at most {MAX_DURATION_HOURS}, got {duration_hours}"
            )));
        }
        let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let end = start
            .checked_add_signed(Duration::hours(i64::from(duration_hours)))
            .ok_or_else(|| {
                RiskError::InvalidInput(format!(
                    "duration_hours {duration_hours} runs past the supported calendar"
                ))
            })?;

        Ok(Self {
            location,
            date,
            duration_hours,
            window: TimeWindow::new(start, end),
        })
    }

    /// Build from loosely typed transport input.
    ///
    /// `date` must be `YYYY-MM-DD`; a missing duration falls back to the
    /// configured default and any duration is capped by the configured maximum.
    pub fn parse(
        location: Location,
        date: &str,
        duration_hours: Option<i64>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
            RiskError::InvalidInput(format!("Invalid date '{date}': expected YYYY-MM-DD ({e})"))
        })?;

        let duration_hours = match duration_hours {
            None => config.default_duration_hours,
            Some(hours) => u32::try_from(hours)
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| {
                    RiskError::InvalidInput(format!(
                        "duration_hours must be a positive integer, got {hours}"
                    ))
                })?,
        };
        if duration_hours > config.max_duration_hours {
            return Err(RiskError::InvalidInput(format!(
                "duration_hours must be at most {}, got {duration_hours}",
                config.max_duration_hours
            )));
        }

        Self::new(location, date, duration_hours)
    }

    /// The event window: midnight UTC on `date` through `duration_hours` later.
    pub fn window(&self) -> TimeWindow {
        self.window
    }
}
