// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Concurrent bulk holder updates.
//!
//! A fixed pool of workers drains a shared job queue. Every worker calls
//! [`CardService::update`] for one item at a time, always on behalf of the
//! caller, and reports exactly one status per item. Statuses are returned in
//! completion order, not input order.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::service::{CardRef, CardService};
use crate::models::{BatchUpdate, BatchUpdateStatus, UpdateStatus};

/// Worker pool size, independent of the batch size.
pub const BATCH_WORKERS: usize = 15;

type Job = (usize, BatchUpdate);
type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Runs batch holder updates on a worker pool.
#[derive(Clone)]
pub struct BatchUpdater {
    cards: Arc<CardService>,
    workers: usize,
}

impl BatchUpdater {
    pub fn new(cards: Arc<CardService>) -> Self {
        Self {
            cards,
            workers: BATCH_WORKERS,
        }
    }

    /// Override the pool size (at least one worker).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Apply every item as `owner_id` and collect one status per item.
    ///
    /// Item failures never abort the batch. An item whose worker died before
    /// reporting is returned as failed.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn update(&self, owner_id: Uuid, items: Vec<BatchUpdate>) -> Vec<BatchUpdateStatus> {
        if items.is_empty() {
            return Vec::new();
        }

        let expected = items.len();
        let card_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();

        let (job_tx, job_rx) = mpsc::unbounded_channel::<Job>();
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<(usize, BatchUpdateStatus)>();
        let jobs: JobQueue = Arc::new(Mutex::new(job_rx));

        let mut pool = JoinSet::new();
        for _ in 0..self.workers {
            pool.spawn(run_worker(
                self.cards.clone(),
                owner_id,
                jobs.clone(),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        for job in items.into_iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut reported = vec![false; expected];
        let mut statuses = Vec::with_capacity(expected);
        while statuses.len() < expected {
            match result_rx.recv().await {
                Some((index, status)) => {
                    reported[index] = true;
                    statuses.push(status);
                }
                None => break,
            }
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Batch worker terminated abnormally");
            }
        }

        for (index, done) in reported.iter().enumerate() {
            if !done {
                statuses.push(BatchUpdateStatus::failed(card_ids[index]));
            }
        }

        let succeeded = statuses
            .iter()
            .filter(|s| s.status == UpdateStatus::Succeeded)
            .count();
        info!(succeeded, total = expected, "Batch update finished");
        statuses
    }
}

async fn run_worker(
    cards: Arc<CardService>,
    owner_id: Uuid,
    jobs: JobQueue,
    results: mpsc::UnboundedSender<(usize, BatchUpdateStatus)>,
) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some((index, item)) = job else {
            break;
        };

        let status = match cards
            .update(CardRef::new(item.id, owner_id), &item.card_holder)
            .await
        {
            Ok(_) => BatchUpdateStatus::succeeded(item.id),
            Err(e) => {
                debug!(card_id = %item.id, error = %e, "Batch item failed");
                BatchUpdateStatus::failed(item.id)
            }
        };

        if results.send((index, status)).is_err() {
            break;
        }
    }
}
