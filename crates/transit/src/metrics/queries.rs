//! Relational traversals over the store: which trips and routes serve a stop,
//! which stops lie on a route, and what leaves next.
//!
//! All of these are linear in the number of stop-times and assume the
//! relationship pass has run for the current generation.

use std::collections::HashSet;

use chrono::NaiveTime;

use crate::identifiers::*;
use crate::models::entities::{Route, Stop, Trip};
use crate::models::traits::TransitProvider;
use crate::models::types::ServiceTime;

/// Distinct trips with a stop-time at `stop_id`, in first-seen order
pub fn trips_touching_stop<'a, P>(provider: &'a P, stop_id: &str) -> Vec<&'a TripIdentifier>
where
    P: TransitProvider + ?Sized,
{
    let mut seen = HashSet::new();
    provider
        .stop_time_sequence()
        .iter()
        .filter(|stop_time| stop_time.stop_id() == stop_id)
        .map(|stop_time| stop_time.trip_id())
        .filter(|trip_id| seen.insert(*trip_id))
        .collect()
}

/// Distinct routes serving `stop_id`, in first-seen order.
///
/// Stop-times whose trip or route doesn't resolve are left out.
pub fn routes_touching_stop<'a, P>(provider: &'a P, stop_id: &str) -> Vec<&'a Route>
where
    P: TransitProvider + ?Sized,
{
    let mut seen = HashSet::new();
    provider
        .stop_time_sequence()
        .iter()
        .filter(|stop_time| stop_time.stop_id() == stop_id)
        .filter_map(|stop_time| provider.get_trip(stop_time.trip_id().as_str()))
        .filter_map(|trip| provider.get_route(trip.route_id().as_str()))
        .filter(|route| seen.insert(route.id()))
        .collect()
}

/// Distinct stops along a route, in first-seen order. Empty if the route is unknown.
pub fn stops_on_route<'a, P>(provider: &'a P, route_id: &str) -> Vec<&'a Stop>
where
    P: TransitProvider + ?Sized,
{
    let Some(route) = provider.get_route(route_id) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    route
        .stop_time_ids()
        .iter()
        .filter_map(|&id| provider.get_stop_time(id))
        .filter_map(|stop_time| provider.get_stop(stop_time.stop_id().as_str()))
        .filter(|stop| seen.insert(stop.id()))
        .collect()
}

/// Stops visited by a trip in reference-list order, repeats included
pub fn stops_on_trip<'a, P>(provider: &'a P, trip: &Trip) -> Vec<&'a Stop>
where
    P: TransitProvider + ?Sized,
{
    trip.stop_time_ids()
        .iter()
        .filter_map(|&id| provider.get_stop_time(id))
        .filter_map(|stop_time| provider.get_stop(stop_time.stop_id().as_str()))
        .collect()
}

// ============================================================================
// Departures
// ============================================================================

/// What a departure listing is anchored on
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepartureAnchor {
    /// Stop-times calling at this stop
    Stop(StopIdentifier),
    /// Trips on this route, by the arrival at their first stop
    Route(RouteIdentifier),
}

#[derive(Clone, Copy, Debug)]
pub struct Departure<'a> {
    pub trip_id: &'a TripIdentifier,
    /// `None` if the stop-time names a trip that isn't loaded
    pub trip: Option<&'a Trip>,
    pub arrival: ServiceTime,
}

/// Up to `limit` departures arriving strictly after `now`, earliest first.
///
/// Arrivals are compared to `now` by time of day, so a `25:10:00` arrival
/// counts as `01:10:00`. `now` is supplied by the caller; no clock is read.
pub fn next_departures<'a, P>(
    provider: &'a P,
    anchor: &DepartureAnchor,
    now: NaiveTime,
    limit: usize,
) -> Vec<Departure<'a>>
where
    P: TransitProvider + ?Sized,
{
    let now = ServiceTime::from(now).time_of_day();

    let mut departures: Vec<Departure<'a>> = match anchor {
        DepartureAnchor::Stop(stop_id) => provider
            .stop_time_sequence()
            .iter()
            .filter(|stop_time| stop_time.stop_id() == stop_id)
            .map(|stop_time| Departure {
                trip_id: stop_time.trip_id(),
                trip: provider.get_trip(stop_time.trip_id().as_str()),
                arrival: stop_time.arrival(),
            })
            .collect(),
        DepartureAnchor::Route(route_id) => provider
            .all_trips()
            .filter(|trip| trip.route_id() == route_id)
            .filter_map(|trip| {
                let first = provider.get_stop_time(*trip.stop_time_ids().first()?)?;
                Some(Departure {
                    trip_id: trip.id(),
                    trip: Some(trip),
                    arrival: first.arrival(),
                })
            })
            .collect(),
    };

    departures.retain(|departure| departure.arrival.time_of_day() > now);
    departures.sort_by_key(|departure| departure.arrival);
    departures.truncate(limit);
    departures
}
