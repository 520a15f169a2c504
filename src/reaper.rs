// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Orphaned Secret Reaper
//!
//! Background task that retries secret purges left behind by card deletes
//! whose secrets-store call failed. The card row is already gone in that
//! case; the path of the secret sits in the orphan ledger until a purge
//! succeeds.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cards::CardService;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically reconciles the orphan ledger with the secrets store.
pub struct OrphanReaper {
    cards: Arc<CardService>,
    sweep_interval: Duration,
}

impl OrphanReaper {
    pub fn new(cards: Arc<CardService>) -> Self {
        Self {
            cards,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(reaper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Orphaned secret reaper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Orphaned secret reaper shutting down");
                return;
            }

            self.sweep().await;

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Orphaned secret reaper shutting down");
                    return;
                }
            }
        }
    }

    /// One reconciliation pass.
    async fn sweep(&self) {
        if let Err(e) = self.cards.reconcile_orphaned_secrets().await {
            warn!(error = %e, "Orphaned secret sweep failed");
        }
    }
}
