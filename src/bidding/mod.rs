/// Bid ledger: validates and records bids against an auction.
///
/// The precondition set (exists, open, beats the standing price) is checked
/// up front for a precise rejection, but acceptance itself rides on the
/// store's compare-and-set primitive — a race lost between the read and the
/// write surfaces as the same `TooLow`/`Closed` rejection, never as a
/// silent overwrite of a concurrently accepted higher bid.
// region:    --- Imports
use crate::broadcast::BroadcastHub;
use crate::error::EngineError;
use crate::events::AuctionEvent;
use crate::store::{Auction, DynStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Bid Policy

/// Deliberate knobs of the bidding rules.
#[derive(Debug, Clone, Default)]
pub struct BidPolicy {
    /// Anti-snipe: when set, a bid accepted with less than this much time
    /// left pushes the deadline out to `now + window`. `None` keeps the
    /// deadline hard.
    pub anti_snipe_window: Option<Duration>,
}

/// Request body for a bid. The bidder identity comes from the
/// already-authenticated caller, never from the body.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub amount: i64,
}

// endregion: --- Bid Policy

// region:    --- Bid Ledger

pub struct BidLedger {
    store: DynStore,
    hub: Arc<BroadcastHub>,
    policy: BidPolicy,
}

impl BidLedger {
    pub fn new(store: DynStore, hub: Arc<BroadcastHub>, policy: BidPolicy) -> Self {
        Self { store, hub, policy }
    }

    /// Place a bid. On success the updated auction is returned and a
    /// `BidAccepted` event is published to the auction's topic.
    pub async fn place_bid(
        &self,
        auction_id: i64,
        amount: i64,
        bidder_identity: &str,
    ) -> Result<Auction, EngineError> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount);
        }
        if bidder_identity.trim().is_empty() {
            return Err(EngineError::MissingIdentity);
        }

        let now = Utc::now();
        let auction = self
            .store
            .get_auction(auction_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        self.check_open(&auction, amount, now)?;

        // The checks above are advisory (precise rejections); the store's
        // compare-and-set re-evaluates them against its own clock at the
        // write instant.
        let extend_to = self.extension_for(&auction, now);
        let accepted = self
            .store
            .try_place_bid(auction_id, bidder_identity, amount, extend_to)
            .await?;

        match accepted {
            Some(updated) => {
                info!(
                    "{:<12} --> bid accepted: auction {} price {} bidder {}",
                    "BidLedger", auction_id, amount, bidder_identity
                );
                self.hub.publish(
                    auction_id,
                    AuctionEvent::BidAccepted {
                        auction_id,
                        price: updated.current_price,
                        deadline: updated.deadline,
                    },
                );
                Ok(updated)
            }
            // Lost the race: re-read and report the state that beat us.
            None => {
                let auction = self
                    .store
                    .get_auction(auction_id)
                    .await?
                    .ok_or(EngineError::NotFound)?;
                self.check_open(&auction, amount, Utc::now())?;
                // The row changed between our read and write but is open
                // again from this vantage point; the bid still lost.
                Err(EngineError::TooLow {
                    current_price: auction.current_price,
                })
            }
        }
    }

    /// Precondition checks in contract order: Closed before TooLow, both
    /// carrying the price the bidder has to beat.
    fn check_open(
        &self,
        auction: &Auction,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if auction.terminal || now >= auction.deadline {
            return Err(EngineError::Closed {
                current_price: auction.current_price,
            });
        }
        if amount <= auction.current_price {
            return Err(EngineError::TooLow {
                current_price: auction.current_price,
            });
        }
        Ok(())
    }

    /// New deadline under the anti-snipe policy, if this bid lands inside
    /// the window.
    fn extension_for(&self, auction: &Auction, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let window = self.policy.anti_snipe_window?;
        if auction.deadline - now <= window {
            Some(now + window)
        } else {
            None
        }
    }
}

// endregion: --- Bid Ledger
