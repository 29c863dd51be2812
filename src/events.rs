use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live events pushed to viewers subscribed to one auction's topic.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum AuctionEvent {
    /// A bid was accepted; `deadline` reflects any anti-snipe extension.
    BidAccepted {
        auction_id: i64,
        price: i64,
        deadline: DateTime<Utc>,
    },
    /// The auction reached its deadline and was finalized.
    AuctionFinished {
        auction_id: i64,
        winner: Option<String>,
    },
}
