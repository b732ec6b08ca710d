//! Shared handle for stores read from more than one thread.
//!
//! Writers hold the exclusive lock for the whole mutation, so a reader either
//! sees the previous generation or the fully relinked new one. Change events
//! are only queued while the lock is held; subscribers receive them on their
//! own tasks once the writer has released it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::entities::{Route, Stop, StopTime, Trip};
use crate::store::{EntityStore, LinkReport, SubscriberId, Subscription};

/// Cheaply cloneable handle to one [`EntityStore`]
#[derive(Clone, Debug, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<EntityStore>>,
}

impl SharedStore {
    pub fn new(store: EntityStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Shared read access. Hold the guard for as long as results borrowed from
    /// the store are in use.
    pub fn read(&self) -> RwLockReadGuard<'_, EntityStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access for entity edits; follow up with `commit_edits`.
    pub fn write(&self) -> RwLockWriteGuard<'_, EntityStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reload(
        &self,
        stops: Vec<Stop>,
        routes: Vec<Route>,
        trips: Vec<Trip>,
        stop_times: Vec<StopTime>,
    ) -> LinkReport {
        self.write().reload(stops, routes, trips, stop_times)
    }

    pub fn append(
        &self,
        stops: Vec<Stop>,
        routes: Vec<Route>,
        trips: Vec<Trip>,
        stop_times: Vec<StopTime>,
    ) -> LinkReport {
        self.write().append(stops, routes, trips, stop_times)
    }

    pub fn commit_edits(&self) -> LinkReport {
        self.write().commit_edits()
    }

    pub fn subscribe(&self) -> Subscription {
        self.write().subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.write().unsubscribe(id)
    }
}

impl From<EntityStore> for SharedStore {
    fn from(store: EntityStore) -> Self {
        Self::new(store)
    }
}
