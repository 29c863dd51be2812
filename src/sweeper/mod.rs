/// Expiry sweeper: the only actor that drives auctions through `finalize`.
///
/// Runs on a fixed interval after a startup grace period. One auction
/// failing to finalize is logged and retried on the next pass; it never
/// takes the loop or the process down.
// region:    --- Imports
use crate::error::EngineError;
use crate::lifecycle::LifecycleManager;
use crate::store::DynStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Expiry Sweeper

pub struct ExpirySweeper {
    store: DynStore,
    lifecycle: Arc<LifecycleManager>,
    sweep_interval: Duration,
    grace: Duration,
}

impl ExpirySweeper {
    pub fn new(
        store: DynStore,
        lifecycle: Arc<LifecycleManager>,
        sweep_interval: Duration,
        grace: Duration,
    ) -> Self {
        Self {
            store,
            lifecycle,
            sweep_interval,
            grace,
        }
    }

    /// Spawn the sweep loop. Flipping `stop` to true ends the loop at the
    /// next check, including between per-auction finalizes mid-pass.
    pub fn start(self, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            // Grace period before the first pass so dependent services can
            // finish coming up.
            tokio::select! {
                _ = tokio::time::sleep(self.grace) => {}
                _ = stop.changed() => {
                    info!("{:<12} --> stopped during grace period", "Sweeper");
                    return;
                }
            }

            let mut ticker = interval(self.sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop.changed() => break,
                }
                if *stop.borrow() {
                    break;
                }
                self.sweep_once(&stop).await;
            }
            info!("{:<12} --> stopped", "Sweeper");
        })
    }

    /// One pass: finalize every auction past its deadline, independently.
    async fn sweep_once(&self, stop: &watch::Receiver<bool>) {
        let due = match self.store.expired_auctions(Utc::now()).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("{:<12} --> failed to query expired auctions: {}", "Sweeper", e);
                return;
            }
        };
        if due.is_empty() {
            return;
        }
        debug!("{:<12} --> {} auction(s) due", "Sweeper", due.len());

        for auction_id in due {
            if *stop.borrow() {
                return;
            }
            match self.lifecycle.finalize(auction_id).await {
                Ok(_) => {}
                // Raced another finalizer, or an anti-snipe extension landed
                // after the due-query; the auction comes back when it is
                // actually due.
                Err(EngineError::NotFound) | Err(EngineError::NotYetExpired { .. }) => {}
                Err(e) => {
                    // Retried naturally on the next pass.
                    error!(
                        "{:<12} --> finalize failed for auction {}: {}",
                        "Sweeper", auction_id, e
                    );
                }
            }
        }
    }
}

// endregion: --- Expiry Sweeper
