//! Core data types and enums for transit data.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// GTFS route types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RouteType {
    Tram = 0,
    Subway = 1,
    Rail = 2,
    Bus = 3,
    Ferry = 4,
    CableTram = 5,
    AerialLift = 6,
    Funicular = 7,
}

impl RouteType {
    pub fn from_gtfs(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Tram),
            1 => Some(Self::Subway),
            2 => Some(Self::Rail),
            3 => Some(Self::Bus),
            4 => Some(Self::Ferry),
            5 => Some(Self::CableTram),
            6 => Some(Self::AerialLift),
            7 => Some(Self::Funicular),
            _ => None,
        }
    }
}

/// Trip direction (0 = outbound, 1 = inbound per GTFS)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DirectionId {
    Outbound = 0,
    Inbound = 1,
}

impl DirectionId {
    pub fn from_gtfs(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Outbound),
            1 => Some(Self::Inbound),
            _ => None,
        }
    }

    pub fn as_gtfs(self) -> u8 {
        self as u8
    }
}

/// GTFS pickup / drop-off codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BoardingType {
    Regular = 0,
    NotAvailable = 1,
    PhoneAgency = 2,
    CoordinateWithDriver = 3,
}

impl BoardingType {
    pub fn from_gtfs(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Regular),
            1 => Some(Self::NotAvailable),
            2 => Some(Self::PhoneAgency),
            3 => Some(Self::CoordinateWithDriver),
            _ => None,
        }
    }

    pub fn as_gtfs(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Service Time
// ============================================================================

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Wall-clock time of a stop event, without a date.
///
/// Stored as seconds since midnight of the service day. Hours may run past 23
/// for trips that continue after midnight (e.g. `25:30:00`); anything up to
/// `47:59:59` is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceTime(u32);

impl ServiceTime {
    pub const MAX_HOURS: u32 = 48;

    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Result<Self> {
        if hours >= Self::MAX_HOURS || minutes >= 60 || seconds >= 60 {
            return Err(TransitError::InvalidTime(format!(
                "{:02}:{:02}:{:02}",
                hours, minutes, seconds
            )));
        }
        Ok(Self(hours * 3600 + minutes * 60 + seconds))
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    /// Seconds since midnight, folded into a single day.
    pub fn time_of_day(self) -> u32 {
        self.0 % SECONDS_PER_DAY
    }

    /// Signed difference `self - earlier` in seconds.
    pub fn seconds_since(self, earlier: ServiceTime) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }
}

impl From<NaiveTime> for ServiceTime {
    fn from(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }
}

impl FromStr for ServiceTime {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TransitError::InvalidTime(s.to_owned());

        let mut parts = s.split(':');
        let mut field = || -> Result<u32> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let hours = field()?;
        let minutes = field()?;
        let seconds = field()?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Self::from_hms(hours, minutes, seconds).map_err(|_| invalid())
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 / 60) % 60,
            self.0 % 60
        )
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Index keys must not be empty")]
    EmptyKey,

    #[error("Latitude out of range [-90, 90]: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range [-180, 180]: {0}")]
    LongitudeOutOfRange(f64),

    #[error("Invalid color (expected 6 hex digits): {0}")]
    InvalidColor(String),

    #[error("Invalid time (expected HH:MM:SS): {0}")]
    InvalidTime(String),

    #[error("Stop not found: {0}")]
    StopNotFound(StopIdentifier),

    #[error("Route not found: {0}")]
    RouteNotFound(RouteIdentifier),

    #[error("Trip not found: {0}")]
    TripNotFound(TripIdentifier),

    #[error("Stop time not found: {0}")]
    StopTimeNotFound(StopTimeId),
}

pub type Result<T> = std::result::Result<T, TransitError>;
