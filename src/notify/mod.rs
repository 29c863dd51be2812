// region:    --- Imports
use crate::store::{Auction, Winner};
use async_trait::async_trait;
use tracing::info;

// endregion: --- Imports

// region:    --- Completion Notifier

/// Outbound notification seam (e.g. email on auction completion).
///
/// Invoked fire-and-forget after finalization; an implementation failing or
/// hanging must never roll back or delay the finalize itself, which is why
/// the lifecycle manager spawns the call.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn auction_finished(&self, auction: &Auction, winner: Option<&Winner>);
}

/// Default notifier: a structured log line, nothing else.
pub struct LogNotifier;

#[async_trait]
impl CompletionNotifier for LogNotifier {
    async fn auction_finished(&self, auction: &Auction, winner: Option<&Winner>) {
        match winner {
            Some(winner) => info!(
                "{:<12} --> auction {} won by {} at {}",
                "Notify", auction.id, winner.bidder_identity, winner.amount
            ),
            None => info!(
                "{:<12} --> auction {} closed with no bids",
                "Notify", auction.id
            ),
        }
    }
}

// endregion: --- Completion Notifier
