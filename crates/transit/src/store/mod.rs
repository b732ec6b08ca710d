//! In-memory relational store for stops, routes, trips and stop-times.
//!
//! Stops, routes and trips are held in [`PrefixIndex`]es keyed by identifier.
//! Stop-times live in one append-ordered sequence whose positions are their
//! [`StopTimeId`]s for the current generation. Trips and routes refer to
//! stop-times only through those ids, so every mutation can rebuild the links
//! from scratch.
//!
//! Every structural mutation (`reload`, `append`, `commit_edits`) re-runs the
//! [`RelationshipBuilder`] before publishing exactly one [`ChangeEvent`].

pub mod notifier;
pub mod relationships;
pub mod shared;

use chrono::NaiveTime;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::identifiers::StopTimeId;
use crate::index::PrefixIndex;
use crate::metrics::queries::{next_departures, Departure, DepartureAnchor};
use crate::models::entities::{Route, Stop, StopTime, Trip};
use crate::models::traits::{Keyed, TransitProvider};
use crate::models::types::{Result, TransitError};

pub use notifier::{ChangeEvent, ChangeNotifier, StoreCounts, SubscriberId, Subscription};
pub use relationships::{LinkReport, RelationshipBuilder};
pub use shared::SharedStore;

/// Search-as-you-type results, one list per keyed collection
#[derive(Debug, Default)]
pub struct SearchResults<'a> {
    pub stops: Vec<&'a Stop>,
    pub routes: Vec<&'a Route>,
    pub trips: Vec<&'a Trip>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() && self.routes.is_empty() && self.trips.is_empty()
    }
}

/// The authoritative store for one running system
#[derive(Debug, Default)]
pub struct EntityStore {
    config: StoreConfig,

    stops: PrefixIndex<Stop>,
    routes: PrefixIndex<Route>,
    trips: PrefixIndex<Trip>,
    stop_times: Vec<StopTime>,

    generation: u64,
    last_links: LinkReport,
    notifier: ChangeNotifier,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of full reloads performed; stop-time ids are scoped to it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Links produced by the most recent relationship rebuild
    pub fn last_links(&self) -> LinkReport {
        self.last_links
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            stops: self.stops.len(),
            routes: self.routes.len(),
            trips: self.trips.len(),
            stop_times: self.stop_times.len(),
        }
    }

    // ---- Mutation ----

    /// Replace all four collections.
    ///
    /// Stop-time ids restart at zero in argument order. Relationships are
    /// rebuilt and observers are notified once.
    pub fn reload(
        &mut self,
        stops: impl IntoIterator<Item = Stop>,
        routes: impl IntoIterator<Item = Route>,
        trips: impl IntoIterator<Item = Trip>,
        stop_times: impl IntoIterator<Item = StopTime>,
    ) -> LinkReport {
        self.stops.clear();
        self.routes.clear();
        self.trips.clear();
        self.stop_times.clear();
        self.generation += 1;

        self.merge(stops, routes, trips, stop_times);
        let report = self.rebuild_relationships();

        let counts = self.counts();
        info!(generation = self.generation, ?counts, "store reloaded");
        self.notifier.notify_all(ChangeEvent::Reloaded {
            generation: self.generation,
            counts,
        });

        report
    }

    /// Merge entities into the existing collections.
    ///
    /// Colliding identifiers are overwritten, stop-time ids continue from the
    /// current sequence length. Relationships are rebuilt over the whole
    /// sequence and observers are notified once.
    pub fn append(
        &mut self,
        stops: impl IntoIterator<Item = Stop>,
        routes: impl IntoIterator<Item = Route>,
        trips: impl IntoIterator<Item = Trip>,
        stop_times: impl IntoIterator<Item = StopTime>,
    ) -> LinkReport {
        self.merge(stops, routes, trips, stop_times);
        let report = self.rebuild_relationships();

        let counts = self.counts();
        info!(generation = self.generation, ?counts, "store appended");
        self.notifier.notify_all(ChangeEvent::Appended {
            generation: self.generation,
            counts,
        });

        report
    }

    /// Publish in-place edits made through the `*_mut` accessors.
    ///
    /// Relationships are rebuilt first, since edits may have changed foreign keys.
    pub fn commit_edits(&mut self) -> LinkReport {
        let report = self.rebuild_relationships();
        self.notifier.notify_all(ChangeEvent::Edited {
            generation: self.generation,
        });
        report
    }

    /// Re-derive every trip and route reference list without notifying.
    pub fn rebuild_relationships(&mut self) -> LinkReport {
        let report =
            RelationshipBuilder::new(&mut self.trips, &mut self.routes).rebuild(&self.stop_times);
        self.last_links = report;
        report
    }

    /// Empty the store and restart generations, keeping subscribers.
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&mut self) {
        self.stops.clear();
        self.routes.clear();
        self.trips.clear();
        self.stop_times.clear();
        self.generation = 0;
        self.last_links = LinkReport::default();
        self.notifier.notify_all(ChangeEvent::Reset);
    }

    fn merge(
        &mut self,
        stops: impl IntoIterator<Item = Stop>,
        routes: impl IntoIterator<Item = Route>,
        trips: impl IntoIterator<Item = Trip>,
        stop_times: impl IntoIterator<Item = StopTime>,
    ) {
        insert_all(&mut self.stops, stops);
        insert_all(&mut self.routes, routes);
        insert_all(&mut self.trips, trips);

        for mut stop_time in stop_times {
            stop_time.id = StopTimeId(self.stop_times.len());
            self.stop_times.push(stop_time);
        }
    }

    // ---- Observers ----

    pub fn subscribe(&mut self) -> Subscription {
        self.notifier.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ---- Lookups ----

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn stop_time(&self, id: StopTimeId) -> Option<&StopTime> {
        self.stop_times.get(id.index())
    }

    // Lookups for callers that treat a missing entity as an error

    pub fn require_stop(&self, id: &str) -> Result<&Stop> {
        self.stop(id).ok_or_else(|| TransitError::StopNotFound(id.into()))
    }

    pub fn require_route(&self, id: &str) -> Result<&Route> {
        self.route(id).ok_or_else(|| TransitError::RouteNotFound(id.into()))
    }

    pub fn require_trip(&self, id: &str) -> Result<&Trip> {
        self.trip(id).ok_or_else(|| TransitError::TripNotFound(id.into()))
    }

    /// Fails for ids from an earlier generation that run past the current sequence.
    pub fn require_stop_time(&self, id: StopTimeId) -> Result<&StopTime> {
        self.stop_time(id).ok_or(TransitError::StopTimeNotFound(id))
    }

    // Setters on the returned entities don't notify; see `commit_edits`.

    pub fn stop_mut(&mut self, id: &str) -> Option<&mut Stop> {
        self.stops.get_mut(id)
    }

    pub fn route_mut(&mut self, id: &str) -> Option<&mut Route> {
        self.routes.get_mut(id)
    }

    pub fn trip_mut(&mut self, id: &str) -> Option<&mut Trip> {
        self.trips.get_mut(id)
    }

    pub fn stop_time_mut(&mut self, id: StopTimeId) -> Option<&mut StopTime> {
        self.stop_times.get_mut(id.index())
    }

    // ---- Collections ----

    pub fn stops(&self) -> &PrefixIndex<Stop> {
        &self.stops
    }

    pub fn routes(&self) -> &PrefixIndex<Route> {
        &self.routes
    }

    pub fn trips(&self) -> &PrefixIndex<Trip> {
        &self.trips
    }

    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }

    /// Linear filter over one collection
    pub fn query<T: Stored>(&self, predicate: impl Fn(&T) -> bool) -> Vec<&T> {
        T::all(self).filter(|&entity| predicate(entity)).collect()
    }

    /// Nearest identifier matches in each keyed collection, up to
    /// `config.search_limit` apiece.
    pub fn search(&self, query: &str) -> SearchResults<'_> {
        let limit = self.config.search_limit;
        SearchResults {
            stops: self.stops.nearest_matches(query, limit),
            routes: self.routes.nearest_matches(query, limit),
            trips: self.trips.nearest_matches(query, limit),
        }
    }

    /// Next departures after `now`, up to `config.departures_limit`
    pub fn upcoming_departures(
        &self,
        anchor: &DepartureAnchor,
        now: NaiveTime,
    ) -> Vec<Departure<'_>> {
        next_departures(self, anchor, now, self.config.departures_limit)
    }
}

fn insert_all<T: Keyed>(index: &mut PrefixIndex<T>, entities: impl IntoIterator<Item = T>) {
    for entity in entities {
        let key = entity.key().to_owned();
        if let Err(err) = index.insert(&key, entity) {
            warn!(%err, "skipping entity without identifier");
        }
    }
}

/// An entity kind held by [`EntityStore`]
pub trait Stored: Sized {
    fn all(store: &EntityStore) -> Box<dyn Iterator<Item = &Self> + '_>;
}

impl Stored for Stop {
    fn all(store: &EntityStore) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(store.stops.iter())
    }
}

impl Stored for Route {
    fn all(store: &EntityStore) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(store.routes.iter())
    }
}

impl Stored for Trip {
    fn all(store: &EntityStore) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(store.trips.iter())
    }
}

impl Stored for StopTime {
    fn all(store: &EntityStore) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(store.stop_times.iter())
    }
}

impl TransitProvider for EntityStore {
    fn get_stop(&self, id: &str) -> Option<&Stop> {
        self.stop(id)
    }

    fn get_route(&self, id: &str) -> Option<&Route> {
        self.route(id)
    }

    fn get_trip(&self, id: &str) -> Option<&Trip> {
        self.trip(id)
    }

    fn get_stop_time(&self, id: StopTimeId) -> Option<&StopTime> {
        self.stop_time(id)
    }

    fn stop_time_sequence(&self) -> &[StopTime] {
        &self.stop_times
    }

    fn all_trips(&self) -> Box<dyn Iterator<Item = &Trip> + '_> {
        Box::new(self.trips.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::ServiceTime;
    use tokio::sync::mpsc::error::TryRecvError;

    fn stop(id: &str) -> Stop {
        Stop::new(id, format!("Stop {id}"), "", 43.0, -87.9).unwrap()
    }

    fn stop_time(trip: &str, stop: &str, seq: u32) -> StopTime {
        let t = ServiceTime::from_hms(8, seq, 0).unwrap();
        StopTime::new(trip, stop, t, t, seq)
    }

    fn loaded_store() -> EntityStore {
        let mut store = EntityStore::new();
        store.reload(
            vec![stop("A"), stop("B")],
            vec![Route::new("R1", "agency", 3)],
            vec![Trip::new("T1", "R1", "wk")],
            vec![stop_time("T1", "A", 1), stop_time("T1", "B", 2)],
        );
        store
    }

    #[test]
    fn test_empty_store() {
        let store = EntityStore::new();
        assert_eq!(store.counts(), StoreCounts::default());
        assert_eq!(store.generation(), 0);
        assert!(store.search("A").is_empty());
    }

    #[test]
    fn test_reload_assigns_dense_ids() {
        let store = loaded_store();

        let ids: Vec<usize> = store.stop_times().iter().map(|st| st.id().index()).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(store.trip("T1").unwrap().stop_time_ids(), &[StopTimeId(0), StopTimeId(1)]);
        assert_eq!(store.route("R1").unwrap().stop_time_ids().len(), 2);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_reload_replaces_rather_than_merges() {
        let mut store = loaded_store();
        store.reload(
            vec![stop("C")],
            Vec::new(),
            vec![Trip::new("T9", "R1", "wk")],
            vec![stop_time("T9", "C", 1)],
        );

        assert!(store.stop("A").is_none());
        assert!(store.route("R1").is_none());
        assert_eq!(store.counts().stop_times, 1);
        assert_eq!(store.stop_times()[0].id(), StopTimeId(0));
        assert_eq!(store.generation(), 2);

        // Trip resolves, its route doesn't
        let links = store.last_links();
        assert_eq!(links.linked_trips, 1);
        assert_eq!(links.unresolved_routes, 1);
    }

    #[test]
    fn test_append_continues_ids_and_relinks() {
        let mut store = loaded_store();
        store.append(
            vec![stop("C")],
            Vec::new(),
            vec![Trip::new("T2", "R1", "wk")],
            vec![stop_time("T1", "C", 3), stop_time("T2", "A", 1)],
        );

        let ids: Vec<usize> = store.stop_times().iter().map(|st| st.id().index()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(
            store.trip("T1").unwrap().stop_time_ids(),
            &[StopTimeId(0), StopTimeId(1), StopTimeId(2)]
        );
        assert_eq!(store.trip("T2").unwrap().stop_time_ids(), &[StopTimeId(3)]);
        assert_eq!(store.route("R1").unwrap().stop_time_ids().len(), 4);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_append_overlapping_ids_counts_distinct() {
        let mut store = EntityStore::new();
        store.append(vec![stop("A"), stop("B")], Vec::new(), Vec::new(), Vec::new());
        store.append(vec![stop("B"), stop("C")], Vec::new(), Vec::new(), Vec::new());

        assert_eq!(store.stops().size(), 3);
    }

    #[test]
    fn test_one_event_per_mutation() {
        let mut store = EntityStore::new();
        let mut sub = store.subscribe();

        store.reload(vec![stop("A")], Vec::new(), Vec::new(), Vec::new());
        assert_eq!(
            sub.receiver.try_recv(),
            Ok(ChangeEvent::Reloaded {
                generation: 1,
                counts: StoreCounts { stops: 1, ..StoreCounts::default() },
            })
        );
        assert_eq!(sub.receiver.try_recv(), Err(TryRecvError::Empty));

        store.append(vec![stop("B")], Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(sub.receiver.try_recv(), Ok(ChangeEvent::Appended { generation: 1, .. })));
        assert_eq!(sub.receiver.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_unsubscribe_leaves_other_subscribers() {
        let mut store = EntityStore::new();
        let mut first = store.subscribe();
        let mut second = store.subscribe();
        assert!(store.unsubscribe(second.id));
        let mut third = store.subscribe();

        store.commit_edits();

        assert_eq!(first.receiver.try_recv(), Ok(ChangeEvent::Edited { generation: 0 }));
        assert_eq!(second.receiver.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(third.receiver.try_recv(), Ok(ChangeEvent::Edited { generation: 0 }));
    }

    #[test]
    fn test_setters_do_not_notify_until_commit() {
        let mut store = loaded_store();
        let mut sub = store.subscribe();

        store.stop_mut("A").unwrap().set_name("Renamed");
        store.trip_mut("T1").unwrap().set_route_id("R_other");
        assert_eq!(sub.receiver.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(store.stop("A").unwrap().name(), "Renamed");

        // Route links still reflect the old foreign key until relationships are rebuilt
        assert_eq!(store.route("R1").unwrap().stop_time_ids().len(), 2);

        let report = store.commit_edits();
        assert_eq!(report.unresolved_routes, 2);
        assert!(store.route("R1").unwrap().stop_time_ids().is_empty());
        assert!(matches!(sub.receiver.try_recv(), Ok(ChangeEvent::Edited { .. })));
    }

    #[test]
    fn test_query_filters_collection() {
        let mut store = loaded_store();
        store.append(
            Vec::new(),
            Vec::new(),
            vec![Trip::new("T2", "R2", "wk"), Trip::new("T3", "R1", "sat")],
            Vec::new(),
        );

        let on_r1: Vec<&str> = store
            .query::<Trip>(|trip| trip.route_id().as_str() == "R1")
            .into_iter()
            .map(|trip| trip.id().as_str())
            .collect();
        assert_eq!(on_r1, vec!["T1", "T3"]);

        let at_b = store.query::<StopTime>(|st| st.stop_id().as_str() == "B");
        assert_eq!(at_b.len(), 1);
    }

    #[test]
    fn test_search_uses_configured_limit() {
        let mut store = EntityStore::with_config(StoreConfig {
            search_limit: 2,
            ..StoreConfig::default()
        });
        store.reload(
            vec![stop("A1"), stop("A2"), stop("A3")],
            vec![Route::new("A9", "agency", 3)],
            Vec::new(),
            Vec::new(),
        );

        let results = store.search("A");
        let stop_ids: Vec<&str> = results.stops.iter().map(|s| s.id().as_str()).collect();
        assert_eq!(stop_ids, vec!["A1", "A2"]);
        assert_eq!(results.routes.len(), 1);
        assert!(results.trips.is_empty());
    }

    #[test]
    fn test_upcoming_departures_uses_configured_limit() {
        let mut store = EntityStore::with_config(StoreConfig {
            departures_limit: 1,
            ..StoreConfig::default()
        });
        store.reload(
            vec![stop("A")],
            Vec::new(),
            vec![Trip::new("T1", "R1", "wk"), Trip::new("T2", "R1", "wk")],
            vec![stop_time("T2", "A", 20), stop_time("T1", "A", 10)],
        );

        let anchor = DepartureAnchor::Stop("A".into());
        let now = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let departures = store.upcoming_departures(&anchor, now);
        assert_eq!(departures.len(), 1);
        assert_eq!(departures[0].trip_id.as_str(), "T1");
        assert_eq!(departures[0].arrival.to_string(), "08:10:00");
    }

    #[test]
    fn test_require_reports_missing_entities() {
        let store = loaded_store();

        assert_eq!(store.require_stop("A").unwrap().id().as_str(), "A");
        assert_eq!(store.require_route("R1").unwrap().stop_time_ids().len(), 2);
        assert_eq!(store.require_trip("T1").unwrap().route_id().as_str(), "R1");
        assert_eq!(store.require_stop_time(StopTimeId(1)).unwrap().stop_id().as_str(), "B");

        assert!(matches!(
            store.require_stop("Z"),
            Err(TransitError::StopNotFound(id)) if id.as_str() == "Z"
        ));
        assert!(matches!(
            store.require_route("R9"),
            Err(TransitError::RouteNotFound(id)) if id.as_str() == "R9"
        ));
        assert!(matches!(
            store.require_trip("T9"),
            Err(TransitError::TripNotFound(id)) if id.as_str() == "T9"
        ));
        assert!(matches!(
            store.require_stop_time(StopTimeId(2)),
            Err(TransitError::StopTimeNotFound(StopTimeId(2)))
        ));

        let err = store.require_trip("T9").unwrap_err();
        assert_eq!(err.to_string(), "Trip not found: T9");
    }

    #[test]
    fn test_reset_empties_store() {
        let mut store = loaded_store();
        let mut sub = store.subscribe();

        store.reset();

        assert_eq!(store.counts(), StoreCounts::default());
        assert_eq!(store.generation(), 0);
        assert_eq!(sub.receiver.try_recv(), Ok(ChangeEvent::Reset));
    }
}
