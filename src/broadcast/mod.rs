/// Topic-per-auction fan-out to live viewers.
///
/// Delivery is best-effort, at-most-once per connected subscriber: there is
/// no backlog, so a viewer that joins late re-fetches auction state through
/// the query API instead of replaying events.
// region:    --- Imports
use crate::events::AuctionEvent;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

// endregion: --- Imports

// region:    --- Broadcast Hub

pub struct BroadcastHub {
    topics: RwLock<HashMap<i64, broadcast::Sender<AuctionEvent>>>,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Join one auction's topic. The topic is created lazily; leaving is
    /// implicit when the receiver is dropped.
    pub fn subscribe(&self, auction_id: i64) -> broadcast::Receiver<AuctionEvent> {
        let mut topics = match self.topics.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics
            .entry(auction_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Fire-and-forget publish; never blocks and never fails the caller.
    /// A topic nobody watches is dropped on the spot.
    pub fn publish(&self, auction_id: i64, event: AuctionEvent) {
        let mut topics = match self.topics.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let deserted = match topics.get(&auction_id) {
            Some(sender) => sender.send(event).is_err(),
            None => {
                debug!("{:<12} --> no viewers on auction {}", "Broadcast", auction_id);
                return;
            }
        };
        if deserted {
            topics.remove(&auction_id);
        }
    }

    /// Viewers currently attached to one topic.
    pub fn viewer_count(&self, auction_id: i64) -> usize {
        let topics = match self.topics.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics
            .get(&auction_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

// endregion: --- Broadcast Hub
