//! Derived metrics computed from the store's current generation.

pub mod distance;
pub mod queries;

pub use distance::{
    haversine_miles, measure_route_distance, measure_trip_average_speed, measure_trip_distance,
    path_miles, route_distance, trip_average_speed, trip_distance, NOT_COMPUTABLE,
};
pub use queries::{
    next_departures, routes_touching_stop, stops_on_route, stops_on_trip, trips_touching_stop,
    Departure, DepartureAnchor,
};
