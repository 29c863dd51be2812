/// Auction lifecycle: creation, state queries and the one-time
/// Active -> Finished transition.
// region:    --- Imports
use crate::broadcast::BroadcastHub;
use crate::error::EngineError;
use crate::events::AuctionEvent;
use crate::notify::{CompletionNotifier, LogNotifier};
use crate::store::{Auction, DynStore, Winner};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateAuctionCommand {
    pub item_id: i64,
    pub starting_price: i64,
    pub duration_secs: i64,
}

/// Result of a finalize call. `AlreadyFinished` is the idempotent no-op the
/// sweeper relies on; it is never an error.
#[derive(Debug)]
pub enum FinalizeOutcome {
    Finished { winner: Option<Winner> },
    AlreadyFinished,
}

// endregion: --- Commands

// region:    --- Lifecycle Manager

pub struct LifecycleManager {
    store: DynStore,
    hub: Arc<BroadcastHub>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl LifecycleManager {
    pub fn new(store: DynStore, hub: Arc<BroadcastHub>) -> Self {
        Self {
            store,
            hub,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn CompletionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Create a new auction running from now until `now + duration`.
    pub async fn create_auction(
        &self,
        cmd: CreateAuctionCommand,
    ) -> Result<Auction, EngineError> {
        if cmd.starting_price < 0 {
            return Err(EngineError::InvalidStartingPrice);
        }
        if cmd.duration_secs <= 0 {
            return Err(EngineError::InvalidDuration);
        }

        let now = Utc::now();
        let auction = Auction {
            id: 0, // assigned by the store
            item_id: cmd.item_id,
            starting_price: cmd.starting_price,
            current_price: cmd.starting_price,
            start_time: now,
            deadline: now + Duration::seconds(cmd.duration_secs),
            terminal: false,
            highest_bidder: None,
            winner_id: None,
        };

        let created = self.store.insert_auction(auction).await?;
        info!(
            "{:<12} --> auction {} created for item {} until {}",
            "Lifecycle", created.id, created.item_id, created.deadline
        );
        Ok(created)
    }

    pub async fn get_auction(&self, auction_id: i64) -> Result<Auction, EngineError> {
        self.store
            .get_auction(auction_id)
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn list_active(&self) -> Result<Vec<Auction>, EngineError> {
        Ok(self.store.list_active(Utc::now()).await?)
    }

    /// The only path that sets `terminal = true`.
    ///
    /// Calling before the deadline is an error to the caller; calling on an
    /// already-finished auction is a no-op. The terminal flip and the Winner
    /// row ride on one store compare-and-set, so a race between the sweeper
    /// and an administrative call finalizes exactly once.
    pub async fn finalize(&self, auction_id: i64) -> Result<FinalizeOutcome, EngineError> {
        let now = Utc::now();
        let auction = self
            .store
            .get_auction(auction_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        if auction.terminal {
            return Ok(FinalizeOutcome::AlreadyFinished);
        }
        if now < auction.deadline {
            return Err(EngineError::NotYetExpired {
                deadline: auction.deadline,
            });
        }

        let Some((closed, winner)) = self.store.try_finalize(auction_id, now).await? else {
            // Another finalizer flipped the flag first.
            return Ok(FinalizeOutcome::AlreadyFinished);
        };

        info!(
            "{:<12} --> auction {} finished, winner: {:?}",
            "Lifecycle",
            auction_id,
            winner.as_ref().map(|w| w.bidder_identity.as_str())
        );

        self.hub.publish(
            auction_id,
            AuctionEvent::AuctionFinished {
                auction_id,
                winner: winner.as_ref().map(|w| w.bidder_identity.clone()),
            },
        );

        // Notification is best-effort and must never hold up finalization.
        let notifier = Arc::clone(&self.notifier);
        let notified_winner = winner.clone();
        tokio::spawn(async move {
            notifier
                .auction_finished(&closed, notified_winner.as_ref())
                .await;
        });

        Ok(FinalizeOutcome::Finished { winner })
    }
}

// endregion: --- Lifecycle Manager
