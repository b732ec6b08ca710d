//! Store tuning knobs.

/// Result limits used by the store's convenience queries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StoreConfig {
    /// Matches returned per collection by search-as-you-type
    pub search_limit: usize,

    /// Entries returned by next-departure listings
    pub departures_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            search_limit: 5,
            departures_limit: 10,
        }
    }
}
