/// Winner handoff: turns a finalized win into a payable cart line and links
/// the resulting order back.
///
/// Authorization rule everywhere here: only the recorded winning bidder sees
/// anything. "No winner" and "not your win" are both `NotFound` so nothing
/// leaks to other users.
// region:    --- Imports
use crate::error::EngineError;
use crate::store::{DynStore, Winner};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Cart Line

/// Priced line item handed to the external checkout flow. Payment capture
/// and order creation happen there, not here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CartLine {
    pub item_id: i64,
    pub price: i64,
    pub quantity: u32,
}

// endregion: --- Cart Line

// region:    --- Winner Handoff

pub struct WinnerHandoff {
    store: DynStore,
}

impl WinnerHandoff {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn get_win(
        &self,
        auction_id: i64,
        requester_identity: &str,
    ) -> Result<Winner, EngineError> {
        let winner = self
            .store
            .get_winner(auction_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        if winner.bidder_identity != requester_identity {
            return Err(EngineError::NotFound);
        }
        Ok(winner)
    }

    /// Idempotent: the first call sets `paid`/`paid_at`, every later call is
    /// rejected with `AlreadyPaid` without touching the row.
    pub async fn mark_paid(
        &self,
        auction_id: i64,
        requester_identity: &str,
    ) -> Result<Winner, EngineError> {
        self.get_win(auction_id, requester_identity).await?;

        match self.store.try_mark_paid(auction_id, Utc::now()).await? {
            Some(winner) => {
                info!(
                    "{:<12} --> win for auction {} marked paid by {}",
                    "Handoff", auction_id, requester_identity
                );
                Ok(winner)
            }
            None => Err(EngineError::AlreadyPaid),
        }
    }

    /// Prepare the checkout line item for an unpaid win.
    pub async fn convert_to_cart_line(
        &self,
        auction_id: i64,
        requester_identity: &str,
    ) -> Result<CartLine, EngineError> {
        let winner = self.get_win(auction_id, requester_identity).await?;
        if winner.paid {
            return Err(EngineError::AlreadyPaid);
        }

        let auction = self
            .store
            .get_auction(auction_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        Ok(CartLine {
            item_id: auction.item_id,
            price: winner.amount,
            quantity: 1,
        })
    }

    /// Record the order id the external checkout produced. Linking twice is
    /// absorbed: the first id sticks.
    pub async fn attach_order(
        &self,
        auction_id: i64,
        requester_identity: &str,
        order_id: i64,
    ) -> Result<Winner, EngineError> {
        self.get_win(auction_id, requester_identity).await?;
        self.store
            .attach_order(auction_id, order_id)
            .await?
            .ok_or(EngineError::NotFound)
    }
}

// endregion: --- Winner Handoff
