//! Transit data models, types, and traits.

pub mod entities;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use entities::{Route, Stop, StopTime, Trip};
pub use traits::{ColumnValues, Keyed, TransitProvider};
pub use types::{BoardingType, DirectionId, RouteType, ServiceTime, TransitError, Result};
