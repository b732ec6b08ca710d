//! Distance and speed calculations.
//!
//! Uses the Haversine formula for the central angle between two stops, then
//! converts degrees of arc to statute miles (60 nautical miles per degree,
//! 1.1515 statute miles per nautical mile).
//!
//! Adjacency is positional: consecutive entries of a trip's stop-time
//! reference list form the legs, whatever their `stop_sequence` values say.

use geo::Point;

use crate::metrics::queries::stops_on_route;
use crate::models::entities::{Route, Stop, Trip};
use crate::models::traits::TransitProvider;

/// Sentinel returned by the `f64` metrics when a value can't be computed
pub const NOT_COMPUTABLE: f64 = -1.0;

const STATUTE_MILES_PER_DEGREE: f64 = 60.0 * 1.1515;

/// Great-circle distance between two points in statute miles
pub fn haversine_miles(p1: Point, p2: Point) -> f64 {
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let half_dlat = (lat2 - lat1) / 2.0;
    let half_dlon = (p2.x() - p1.x()).to_radians() / 2.0;

    let a = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
    let central_angle = 2.0 * a.sqrt().min(1.0).asin();

    central_angle.to_degrees() * STATUTE_MILES_PER_DEGREE
}

/// Sum of leg lengths along `points`, in order
pub fn path_miles(points: impl IntoIterator<Item = Point>) -> f64 {
    let mut points = points.into_iter();
    let Some(mut previous) = points.next() else {
        return 0.0;
    };

    let mut total = 0.0;
    for point in points {
        total += haversine_miles(previous, point);
        previous = point;
    }
    total
}

fn positive(total: f64) -> Option<f64> {
    (total > 0.0).then_some(total)
}

/// Resolved stop for each entry of the trip's reference list, `None` where a
/// link is broken
fn resolved_stops<'a, P>(provider: &'a P, trip: &Trip) -> Vec<Option<&'a Stop>>
where
    P: TransitProvider + ?Sized,
{
    trip.stop_time_ids()
        .iter()
        .map(|&id| {
            provider
                .get_stop_time(id)
                .and_then(|stop_time| provider.get_stop(stop_time.stop_id().as_str()))
        })
        .collect()
}

/// Distance of a trip in miles, or `None` when fewer than two consecutive
/// stop-times resolve to stops (or the stops coincide).
///
/// Legs with an unresolved end are skipped rather than bridged.
pub fn measure_trip_distance<P>(provider: &P, trip: &Trip) -> Option<f64>
where
    P: TransitProvider + ?Sized,
{
    let stops = resolved_stops(provider, trip);
    let total: f64 = stops
        .windows(2)
        .filter_map(|leg| match leg {
            [Some(from), Some(to)] => Some(haversine_miles(from.location(), to.location())),
            _ => None,
        })
        .sum();
    positive(total)
}

/// Distance of a trip in miles, or [`NOT_COMPUTABLE`]
pub fn trip_distance<P>(provider: &P, trip: &Trip) -> f64
where
    P: TransitProvider + ?Sized,
{
    measure_trip_distance(provider, trip).unwrap_or(NOT_COMPUTABLE)
}

/// Average speed of a trip in miles per hour.
///
/// Elapsed time runs from the first to the last referenced stop-time's
/// arrival, truncated to whole minutes. `None` when there are fewer than two
/// stop-times, the distance isn't computable, or no whole minute elapses.
pub fn measure_trip_average_speed<P>(provider: &P, trip: &Trip) -> Option<f64>
where
    P: TransitProvider + ?Sized,
{
    let ids = trip.stop_time_ids();
    if ids.len() < 2 {
        return None;
    }

    let first = provider.get_stop_time(ids[0])?;
    let last = provider.get_stop_time(ids[ids.len() - 1])?;
    let elapsed_minutes = last.arrival().seconds_since(first.arrival()) / 60;
    if elapsed_minutes <= 0 {
        return None;
    }

    let distance = measure_trip_distance(provider, trip)?;
    Some(distance / (elapsed_minutes as f64 / 60.0))
}

/// Average speed of a trip in miles per hour, or [`NOT_COMPUTABLE`]
pub fn trip_average_speed<P>(provider: &P, trip: &Trip) -> f64
where
    P: TransitProvider + ?Sized,
{
    measure_trip_average_speed(provider, trip).unwrap_or(NOT_COMPUTABLE)
}

/// Length in miles of the path through the route's distinct stops, in the
/// order they are first served.
pub fn measure_route_distance<P>(provider: &P, route: &Route) -> Option<f64>
where
    P: TransitProvider + ?Sized,
{
    let stops = stops_on_route(provider, route.id().as_str());
    positive(path_miles(stops.iter().map(|stop| stop.location())))
}

/// Route path length in miles, or [`NOT_COMPUTABLE`]
pub fn route_distance<P>(provider: &P, route: &Route) -> f64
where
    P: TransitProvider + ?Sized,
{
    measure_route_distance(provider, route).unwrap_or(NOT_COMPUTABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::HaversineDistance;

    use crate::models::entities::StopTime;
    use crate::models::types::ServiceTime;
    use crate::store::EntityStore;

    const METERS_PER_MILE: f64 = 1609.344;

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop::new(id, id, "", lat, lon).unwrap()
    }

    fn stop_time(trip: &str, stop: &str, arrival: &str, seq: u32) -> StopTime {
        let t: ServiceTime = arrival.parse().unwrap();
        StopTime::new(trip, stop, t, t, seq)
    }

    fn equator_store(stop_times: Vec<StopTime>) -> EntityStore {
        let mut store = EntityStore::new();
        store.reload(
            vec![stop("S0", 0.0, 0.0), stop("S1", 0.0, 1.0), stop("S2", 0.0, 2.0)],
            vec![Route::new("R1", "agency", 3)],
            vec![Trip::new("T1", "R1", "wk")],
            stop_times,
        );
        store
    }

    #[test]
    fn test_one_degree_at_equator() {
        let miles = haversine_miles(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert_relative_eq!(miles, 69.09, epsilon = 1e-9);
    }

    #[test]
    fn test_haversine_close_to_geo() {
        // Distance from NYC to LA is approximately 2,446 miles
        let nyc = Point::new(-74.0060, 40.7128);
        let la = Point::new(-118.2437, 34.0522);

        let miles = haversine_miles(nyc, la);
        let geo_miles = nyc.haversine_distance(&la) / METERS_PER_MILE;
        assert_relative_eq!(miles, geo_miles, max_relative = 0.01);
        assert!((miles - 2_446.0).abs() < 30.0);
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = Point::new(-87.9065, 43.0389);
        assert_eq!(haversine_miles(p, p), 0.0);
        assert_eq!(path_miles(Vec::new()), 0.0);
        assert_eq!(path_miles(vec![p]), 0.0);
    }

    #[test]
    fn test_trip_distance_and_speed() {
        let store = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S1", "08:10:00", 2),
            stop_time("T1", "S2", "08:20:00", 3),
        ]);
        let trip = store.trip("T1").unwrap();

        assert_relative_eq!(trip_distance(&store, trip), 138.18, epsilon = 1e-6);
        assert_relative_eq!(trip_average_speed(&store, trip), 414.54, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_symmetric_under_reversal() {
        let forward = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S2", "08:10:00", 2),
            stop_time("T1", "S1", "08:20:00", 3),
        ]);
        let reversed = equator_store(vec![
            stop_time("T1", "S1", "08:00:00", 1),
            stop_time("T1", "S2", "08:10:00", 2),
            stop_time("T1", "S0", "08:20:00", 3),
        ]);

        let d_forward = trip_distance(&forward, forward.trip("T1").unwrap());
        let d_reversed = trip_distance(&reversed, reversed.trip("T1").unwrap());
        assert_relative_eq!(d_forward, d_reversed, epsilon = 1e-9);

        // Positional adjacency: S0 -> S2 -> S1 is longer than S0 -> S1 -> S2
        assert_relative_eq!(d_forward, 3.0 * 69.09, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_ignores_stop_sequence_field() {
        // Sequence numbers claim S0, S1, S2 but file order is S0, S2, S1
        let store = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S2", "08:20:00", 3),
            stop_time("T1", "S1", "08:10:00", 2),
        ]);
        let distance = trip_distance(&store, store.trip("T1").unwrap());
        assert_relative_eq!(distance, 3.0 * 69.09, epsilon = 1e-6);
    }

    #[test]
    fn test_sentinel_with_too_few_stop_times() {
        let none = equator_store(Vec::new());
        let trip = none.trip("T1").unwrap();
        assert_eq!(trip_distance(&none, trip), NOT_COMPUTABLE);
        assert_eq!(trip_average_speed(&none, trip), NOT_COMPUTABLE);

        let one = equator_store(vec![stop_time("T1", "S0", "08:00:00", 1)]);
        let trip = one.trip("T1").unwrap();
        assert_eq!(trip_distance(&one, trip), NOT_COMPUTABLE);
        assert_eq!(measure_trip_average_speed(&one, trip), None);
    }

    #[test]
    fn test_unresolved_stops_skip_legs() {
        let store = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S_missing", "08:05:00", 2),
            stop_time("T1", "S1", "08:10:00", 3),
            stop_time("T1", "S2", "08:20:00", 4),
        ]);
        let distance = trip_distance(&store, store.trip("T1").unwrap());
        assert_relative_eq!(distance, 69.09, epsilon = 1e-6);

        let only_missing = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S_missing", "08:05:00", 2),
        ]);
        let trip = only_missing.trip("T1").unwrap();
        assert_eq!(measure_trip_distance(&only_missing, trip), None);
    }

    #[test]
    fn test_speed_truncates_to_whole_minutes() {
        let store = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S1", "08:30:59", 2),
        ]);
        let speed = trip_average_speed(&store, store.trip("T1").unwrap());
        assert_relative_eq!(speed, 69.09 * 2.0, epsilon = 1e-6);

        let instant = equator_store(vec![
            stop_time("T1", "S0", "08:00:00", 1),
            stop_time("T1", "S1", "08:00:59", 2),
        ]);
        assert_eq!(trip_average_speed(&instant, instant.trip("T1").unwrap()), NOT_COMPUTABLE);
    }

    #[test]
    fn test_route_distance_over_distinct_stops() {
        let mut store = equator_store(Vec::new());
        store.append(
            Vec::new(),
            Vec::new(),
            vec![Trip::new("T2", "R1", "wk")],
            vec![
                stop_time("T1", "S0", "08:00:00", 1),
                stop_time("T1", "S1", "08:10:00", 2),
                stop_time("T2", "S1", "09:00:00", 1),
                stop_time("T2", "S2", "09:10:00", 2),
            ],
        );
        let route = store.route("R1").unwrap();
        assert_relative_eq!(route_distance(&store, route), 138.18, epsilon = 1e-6);

        let empty = Route::new("R_empty", "agency", 3);
        assert_eq!(route_distance(&store, &empty), NOT_COMPUTABLE);
    }
}
