//! Forward adjacency from stop-times to trips and routes.
//!
//! Trips and routes only hold [`StopTimeId`]s into the stop-time sequence, so a
//! rebuild is a clear followed by one pass over the sequence. Foreign keys that
//! don't resolve are skipped and counted in the returned [`LinkReport`].

use tracing::{debug, trace};

use crate::identifiers::StopTimeId;
use crate::index::PrefixIndex;
use crate::models::entities::{Route, StopTime, Trip};

/// Outcome of a relationship rebuild
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Stop-times appended to a trip's reference list
    pub linked_trips: usize,
    /// Stop-times appended to a route's reference list
    pub linked_routes: usize,
    /// Stop-times whose trip id matched no trip
    pub unresolved_trips: usize,
    /// Stop-times whose trip's route id matched no route
    pub unresolved_routes: usize,
}

impl LinkReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved_trips == 0 && self.unresolved_routes == 0
    }
}

pub struct RelationshipBuilder<'a> {
    trips: &'a mut PrefixIndex<Trip>,
    routes: &'a mut PrefixIndex<Route>,
}

impl<'a> RelationshipBuilder<'a> {
    pub fn new(trips: &'a mut PrefixIndex<Trip>, routes: &'a mut PrefixIndex<Route>) -> Self {
        Self { trips, routes }
    }

    /// Replace every trip and route reference list with links derived from
    /// `stop_times`, in sequence order.
    pub fn rebuild(self, stop_times: &[StopTime]) -> LinkReport {
        for trip in self.trips.values_mut() {
            trip.stop_time_ids.clear();
        }
        for route in self.routes.values_mut() {
            route.stop_time_ids.clear();
        }

        let mut report = LinkReport::default();

        for (position, stop_time) in stop_times.iter().enumerate() {
            let id = StopTimeId(position);

            let Some(trip) = self.trips.get_mut(stop_time.trip_id().as_str()) else {
                trace!(stop_time = %id, trip_id = %stop_time.trip_id(), "unresolved trip");
                report.unresolved_trips += 1;
                continue;
            };
            trip.stop_time_ids.push(id);
            report.linked_trips += 1;

            let Some(route) = self.routes.get_mut(trip.route_id().as_str()) else {
                trace!(stop_time = %id, route_id = %trip.route_id(), "unresolved route");
                report.unresolved_routes += 1;
                continue;
            };
            route.stop_time_ids.push(id);
            report.linked_routes += 1;
        }

        debug!(
            linked_trips = report.linked_trips,
            linked_routes = report.linked_routes,
            unresolved_trips = report.unresolved_trips,
            unresolved_routes = report.unresolved_routes,
            "relationships rebuilt"
        );

        report
    }
}
