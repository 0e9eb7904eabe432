#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transit stop and schedule feed types.
//!
//! Row types mirror the columns of the GTFS static files the pipeline
//! reads (`stops.txt`, `calendar.txt`, `trips.txt`, `stop_times.txt`).
//! Columns not listed here are ignored by the CSV reader.

use serde::{Deserialize, Serialize};

/// A geo-located transit stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitStop {
    /// Numeric stop identifier.
    pub stop_id: u64,
    /// Human-readable stop name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A row of `stops.txt`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopRecord {
    /// Feed stop identifier, parsed to a number on load.
    pub stop_id: String,
    /// Display name.
    #[serde(default)]
    pub stop_name: String,
    /// Latitude in degrees.
    pub stop_lat: f64,
    /// Longitude in degrees.
    pub stop_lon: f64,
}

/// A row of `calendar.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarEntry {
    /// Service the day flags apply to.
    pub service_id: String,
    /// `1` if the service runs on Mondays.
    pub monday: u8,
    /// `1` if the service runs on Tuesdays.
    pub tuesday: u8,
    /// `1` if the service runs on Wednesdays.
    pub wednesday: u8,
    /// `1` if the service runs on Thursdays.
    pub thursday: u8,
    /// `1` if the service runs on Fridays.
    pub friday: u8,
    /// `1` if the service runs on Saturdays.
    #[serde(default)]
    pub saturday: u8,
    /// `1` if the service runs on Sundays.
    #[serde(default)]
    pub sunday: u8,
}

impl CalendarEntry {
    /// Returns `true` if the service runs on every day Monday to Friday.
    #[must_use]
    pub const fn runs_every_weekday(&self) -> bool {
        self.monday == 1
            && self.tuesday == 1
            && self.wednesday == 1
            && self.thursday == 1
            && self.friday == 1
    }
}

/// A row of `trips.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TripRecord {
    /// Trip identifier.
    pub trip_id: String,
    /// Service calendar the trip runs on.
    pub service_id: String,
}

/// A row of `stop_times.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StopTimeRecord {
    /// Trip the visit belongs to.
    pub trip_id: String,
    /// Scheduled arrival.
    pub arrival_time: ServiceTime,
    /// Scheduled departure.
    pub departure_time: ServiceTime,
    /// Visited stop.
    pub stop_id: String,
    /// Position within the trip, if the feed gives one.
    #[serde(default)]
    pub stop_sequence: Option<u32>,
}

/// A wall-clock schedule time in seconds after service-day midnight.
///
/// GTFS allows hours past 23 for trips running beyond midnight, so this is
/// not a time of day.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Builds a time from hours, minutes and seconds.
    #[must_use]
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Seconds after midnight.
    #[must_use]
    pub const fn seconds(self) -> u32 {
        self.0
    }

    /// Hour component (may exceed 23).
    #[must_use]
    pub const fn hour(self) -> u32 {
        self.0 / 3600
    }

    /// Signed difference `self - earlier` in minutes.
    #[must_use]
    pub fn minutes_since(self, earlier: Self) -> f64 {
        (f64::from(self.0) - f64::from(earlier.0)) / 60.0
    }
}

/// Error returned when a schedule time is not `H:MM:SS` / `HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidServiceTime {
    /// The offending input.
    pub value: String,
}

impl std::fmt::Display for InvalidServiceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid schedule time {:?}: expected HH:MM:SS", self.value)
    }
}

impl std::error::Error for InvalidServiceTime {}

impl std::str::FromStr for ServiceTime {
    type Err = InvalidServiceTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidServiceTime {
            value: s.to_string(),
        };
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        let hours: u32 = h.parse().map_err(|_| err())?;
        let minutes: u32 = m.parse().map_err(|_| err())?;
        let seconds: u32 = sec.parse().map_err(|_| err())?;
        if minutes > 59 || seconds > 59 || m.len() != 2 || sec.len() != 2 {
            return Err(err());
        }
        Ok(Self::from_hms(hours, minutes, seconds))
    }
}

impl TryFrom<String> for ServiceTime {
    type Error = InvalidServiceTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceTime> for String {
    fn from(value: ServiceTime) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0;
        write!(f, "{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }
}
