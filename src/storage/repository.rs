// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistence contracts for card records.
//!
//! Writes always go through an explicit [`CardTransaction`] obtained from
//! [`CardStore::begin`]. Nothing is durable until `commit` is called;
//! dropping an uncommitted transaction rolls it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OwnedResource, StoreResult};

/// Card row as held in the relational store.
///
/// Only the first four digits of the PAN ever reach this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCard {
    /// Unique card identifier (generated by the service)
    pub id: Uuid,
    /// Card holder name (the only mutable field)
    pub card_holder: String,
    /// PAN residue (first four digits)
    pub pan_residue: String,
    /// Internal user ID of the owner
    pub owner_id: Uuid,
    /// When the row was created
    pub created_at: DateTime<Utc>,
    /// When the holder name last changed
    pub updated_at: DateTime<Utc>,
}

impl StoredCard {
    /// Build a fresh row stamped with the current time.
    pub fn new(
        id: Uuid,
        card_holder: impl Into<String>,
        pan_residue: impl Into<String>,
        owner_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            card_holder: card_holder.into(),
            pan_residue: pan_residue.into(),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl OwnedResource for StoredCard {
    fn owner_id(&self) -> &Uuid {
        &self.owner_id
    }
}

/// Relational store for card rows.
pub trait CardStore: Send + Sync {
    /// Open a write transaction.
    fn begin(&self) -> StoreResult<Box<dyn CardTransaction>>;

    /// Read a card outside of any transaction.
    fn get(&self, id: &Uuid) -> StoreResult<Option<StoredCard>>;

    /// Number of stored cards.
    fn count(&self) -> StoreResult<usize>;

    /// Secret paths whose deletion from the secrets store is still pending.
    fn orphaned_secrets(&self) -> StoreResult<Vec<String>>;
}

/// A single all-or-nothing unit of work against the relational store.
pub trait CardTransaction {
    /// Insert a new card row. Fails with `AlreadyExists` on id collision.
    fn insert(&mut self, card: &StoredCard) -> StoreResult<()>;

    /// Read a card, observing this transaction's own writes.
    fn get(&self, id: &Uuid) -> StoreResult<Option<StoredCard>>;

    /// Replace the holder name of an existing card.
    fn update_holder(&mut self, id: &Uuid, card_holder: &str) -> StoreResult<()>;

    /// Remove a card row.
    fn remove(&mut self, id: &Uuid) -> StoreResult<()>;

    /// Record a secret path that must be purged from the secrets store.
    fn mark_orphaned_secret(&mut self, path: &str) -> StoreResult<()>;

    /// Forget a secret path once it has been purged.
    fn clear_orphaned_secret(&mut self, path: &str) -> StoreResult<()>;

    /// Make every write in this transaction durable.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}
