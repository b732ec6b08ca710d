//! Core traits for transit entities.
//!
//! These traits define the public interface for transit data: how entities are
//! keyed in the prefix index, how they project onto delimited text columns,
//! and the read-only lookups derived metrics are computed against.

use crate::identifiers::*;
use crate::models::entities::{Route, Stop, StopTime, Trip};

// ============================================================================
// Entity Traits
// ============================================================================

/// An entity stored in a [`PrefixIndex`](crate::index::PrefixIndex) under its identifier.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Fixed-order column projection used by exporters.
///
/// `COLUMNS` holds the GTFS header names; `column_values` returns one string
/// per column in the same order, with absent optional values rendered empty.
pub trait ColumnValues {
    const COLUMNS: &'static [&'static str];

    fn column_values(&self) -> Vec<String>;

    fn to_delimited_row(&self, delimiter: char) -> String {
        self.column_values().join(&delimiter.to_string())
    }

    fn header_row(delimiter: char) -> String
    where
        Self: Sized,
    {
        Self::COLUMNS.join(&delimiter.to_string())
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Read-only access to a loaded transit dataset
pub trait TransitProvider {
    // ---- Lookups ----
    fn get_stop(&self, id: &str) -> Option<&Stop>;
    fn get_route(&self, id: &str) -> Option<&Route>;
    fn get_trip(&self, id: &str) -> Option<&Trip>;
    fn get_stop_time(&self, id: StopTimeId) -> Option<&StopTime>;

    // ---- Collections ----

    /// Stop-times in generation order; position equals [`StopTimeId`]
    fn stop_time_sequence(&self) -> &[StopTime];

    fn all_trips(&self) -> Box<dyn Iterator<Item = &Trip> + '_>;
}
