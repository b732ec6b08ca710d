//! Change notification for store observers.
//!
//! Each subscriber owns the receiving half of an unbounded channel. The store
//! publishes one [`ChangeEvent`] per structural mutation; sending never blocks,
//! so observers run on their own schedule and never see the store mid-update.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// Entity counts after a mutation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub stops: usize,
    pub routes: usize,
    pub trips: usize,
    pub stop_times: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// All collections were replaced
    Reloaded { generation: u64, counts: StoreCounts },

    /// Entities were merged into the existing collections
    Appended { generation: u64, counts: StoreCounts },

    /// In-place entity edits were committed
    Edited { generation: u64 },

    /// The store was emptied by a test harness
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// A registration with a [`ChangeNotifier`]
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: UnboundedReceiver<ChangeEvent>,
}

#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: Vec<(SubscriberId, UnboundedSender<ChangeEvent>)>,
    next_id: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer. Subscribing twice yields two independent
    /// subscriptions, each receiving every event.
    pub fn subscribe(&mut self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, sender));
        Subscription { id, receiver }
    }

    /// Returns whether the subscription was registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every subscriber in registration order.
    ///
    /// Subscribers whose receiver has been dropped are removed.
    pub fn notify_all(&mut self, event: ChangeEvent) {
        self.subscribers.retain(|(id, sender)| {
            let delivered = sender.send(event.clone()).is_ok();
            if !delivered {
                trace!(?id, "dropping closed subscriber");
            }
            delivered
        });
    }
}
