/// Storage seam for the bidding engine.
///
/// Every mutation the engine depends on for correctness is exposed as an
/// atomic conditional primitive (`try_*`): the implementation must apply the
/// condition and the write in one step, never read-then-write. `None` from a
/// `try_*` method means the condition did not hold at the moment of the
/// write; the caller re-reads to classify the loss.
// region:    --- Imports
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod memory;
pub mod postgres;
mod queries;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// endregion: --- Imports

// region:    --- Models

/// A timed ascending-price sale of one item.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Auction {
    pub id: i64,
    pub item_id: i64,
    pub starting_price: i64,
    pub current_price: i64,
    pub start_time: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub terminal: bool,
    pub highest_bidder: Option<String>,
    pub winner_id: Option<i64>,
}

impl Auction {
    /// Open for bids: started, not terminal, deadline not reached.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.terminal && now >= self.start_time && now < self.deadline
    }

    /// Past deadline and still not finalized.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.terminal && now >= self.deadline
    }
}

/// One accepted price offer. Append-only.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_identity: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Durable outcome of a finalized auction, at most one per auction.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Winner {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_identity: String,
    pub amount: i64,
    pub won_at: DateTime<Utc>,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub order_id: Option<i64>,
}

// endregion: --- Models

// region:    --- Store Trait

pub type DynStore = Arc<dyn AuctionStore>;

#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Persist a new auction; the `id` field of the input is ignored and the
    /// stored row (with its assigned id) is returned.
    async fn insert_auction(&self, auction: Auction) -> Result<Auction, StoreError>;

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>, StoreError>;

    /// All auctions open for bids at `now`, oldest deadline first.
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError>;

    /// Full bid history for one auction, most recent first.
    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, StoreError>;

    /// Compare-and-set bid acceptance: raises price/bidder and appends the
    /// Bid row only if the auction is still non-terminal, the deadline has
    /// not passed and `amount` beats the stored price. The deadline check
    /// and the bid's `created_at` use the store's clock at the write
    /// instant, so a request that stalls before reaching the store cannot
    /// smuggle a stale timestamp past the deadline. `extend_to`, when set,
    /// moves the deadline in the same atomic write (anti-snipe) but never
    /// backwards: a stale extension loses to a later one already applied.
    ///
    /// Returns the updated auction, or `None` if the condition failed.
    async fn try_place_bid(
        &self,
        auction_id: i64,
        bidder_identity: &str,
        amount: i64,
        extend_to: Option<DateTime<Utc>>,
    ) -> Result<Option<Auction>, StoreError>;

    /// Ids of all non-terminal auctions whose deadline has passed.
    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<i64>, StoreError>;

    /// Compare-and-set finalization: flips `terminal` only if it was false,
    /// and creates the Winner row (when a highest bidder exists) in the same
    /// atomic step. `None` means the auction was already terminal — the
    /// caller lost the race and must treat it as a no-op.
    async fn try_finalize(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<(Auction, Option<Winner>)>, StoreError>;

    async fn get_winner(&self, auction_id: i64) -> Result<Option<Winner>, StoreError>;

    /// Sets `paid`/`paid_at` only if the row was unpaid; `None` means it was
    /// already paid.
    async fn try_mark_paid(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Winner>, StoreError>;

    /// Links the external order id only if none is linked yet; returns the
    /// row as stored either way (repeat calls are no-ops).
    async fn attach_order(
        &self,
        auction_id: i64,
        order_id: i64,
    ) -> Result<Option<Winner>, StoreError>;
}

// endregion: --- Store Trait
