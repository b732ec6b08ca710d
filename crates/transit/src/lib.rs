//! # transit-store
//!
//! In-memory relational store for static transit schedules.
//!
//! ## Features
//!
//! - **Prefix search**: Identifiers are held in tries with nearest-match lookup
//! - **Relationship rebuilds**: Trip and route stop-time lists are re-derived on every load
//! - **Derived metrics**: Haversine trip distances, average speeds, next departures
//! - **Change notification**: One event per mutation, delivered over channels
//!
//! ## Example
//!
//! ```
//! use transit_store::prelude::*;
//!
//! let mut store = EntityStore::new();
//! let eight = ServiceTime::from_hms(8, 0, 0).unwrap();
//! let eight_ten = ServiceTime::from_hms(8, 10, 0).unwrap();
//!
//! store.reload(
//!     vec![
//!         Stop::new("S0", "Ocean Ave", "", 0.0, 0.0).unwrap(),
//!         Stop::new("S1", "Bay St", "", 0.0, 1.0).unwrap(),
//!     ],
//!     vec![Route::new("R1", "metro", 3)],
//!     vec![Trip::new("T1", "R1", "weekday")],
//!     vec![
//!         StopTime::new("T1", "S0", eight, eight, 1),
//!         StopTime::new("T1", "S1", eight_ten, eight_ten, 2),
//!     ],
//! );
//!
//! let trip = store.trip("T1").unwrap();
//! assert_eq!(trip.stop_time_ids().len(), 2);
//! assert!((trip_distance(&store, trip) - 69.09).abs() < 1e-6);
//!
//! // Search-as-you-type falls back to nearby identifiers
//! let results = store.search("S9");
//! assert_eq!(results.stops.len(), 2);
//! ```

pub mod config;
pub mod identifiers;
pub mod index;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod store;

// Re-exports for convenience
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::identifiers::*;
    pub use crate::index::PrefixIndex;
    pub use crate::metrics::*;
    pub use crate::models::{entities::*, traits::*, types::*};
    pub use crate::store::{
        ChangeEvent, EntityStore, LinkReport, SearchResults, SharedStore, StoreCounts,
        SubscriberId, Subscription,
    };
}

pub use prelude::*;
