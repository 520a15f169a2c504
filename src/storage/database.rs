// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded relational store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `cards`: card_id → serialized StoredCard
//! - `users`: external subject → serialized StoredUser
//! - `orphaned_secrets`: secret path → unix timestamp of the failed purge

use std::path::Path;

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use uuid::Uuid;

use super::repository::{CardStore, CardTransaction, StoredCard};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: card_id → serialized StoredCard (JSON bytes).
const CARDS: TableDefinition<&str, &[u8]> = TableDefinition::new("cards");

/// Identity table: external subject → serialized StoredUser (JSON bytes).
pub(super) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Secret paths still waiting to be purged from the secrets store.
const ORPHANED_SECRETS: TableDefinition<&str, i64> = TableDefinition::new("orphaned_secrets");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID database holding cards and users.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CARDS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(ORPHANED_SECRETS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(super) fn inner(&self) -> &redb::Database {
        &self.db
    }
}

impl CardStore for Database {
    fn begin(&self) -> StoreResult<Box<dyn CardTransaction>> {
        let txn = self.db.begin_write()?;
        Ok(Box::new(RedbCardTransaction { txn }))
    }

    fn get(&self, id: &Uuid) -> StoreResult<Option<StoredCard>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS)?;
        let key = id.to_string();
        let existing = table.get(key.as_str())?;
        match existing {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn count(&self) -> StoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS)?;
        let count = table.iter()?.count();
        Ok(count)
    }

    fn orphaned_secrets(&self) -> StoreResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORPHANED_SECRETS)?;

        let mut paths = Vec::new();
        for entry in table.iter()? {
            let (path, _) = entry?;
            paths.push(path.value().to_string());
        }
        Ok(paths)
    }
}

// =============================================================================
// Write Transaction
// =============================================================================

/// A redb write transaction. Dropping it without `commit` aborts it.
struct RedbCardTransaction {
    txn: WriteTransaction,
}

impl RedbCardTransaction {
    fn read_card(&self, key: &str) -> StoreResult<Option<StoredCard>> {
        let table = self.txn.open_table(CARDS)?;
        let existing = table.get(key)?;
        match existing {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn write_card(&self, card: &StoredCard) -> StoreResult<()> {
        let json = serde_json::to_vec(card)?;
        let key = card.id.to_string();
        let mut table = self.txn.open_table(CARDS)?;
        table.insert(key.as_str(), json.as_slice())?;
        Ok(())
    }
}

impl CardTransaction for RedbCardTransaction {
    fn insert(&mut self, card: &StoredCard) -> StoreResult<()> {
        let key = card.id.to_string();
        if self.read_card(&key)?.is_some() {
            return Err(StoreError::AlreadyExists(format!("Card {key}")));
        }
        self.write_card(card)
    }

    fn get(&self, id: &Uuid) -> StoreResult<Option<StoredCard>> {
        self.read_card(&id.to_string())
    }

    fn update_holder(&mut self, id: &Uuid, card_holder: &str) -> StoreResult<()> {
        let mut card = self
            .read_card(&id.to_string())?
            .ok_or_else(|| StoreError::NotFound(format!("Card {id}")))?;

        card.card_holder = card_holder.to_string();
        card.updated_at = Utc::now();
        self.write_card(&card)
    }

    fn remove(&mut self, id: &Uuid) -> StoreResult<()> {
        let key = id.to_string();
        let mut table = self.txn.open_table(CARDS)?;
        let removed = table.remove(key.as_str())?.is_some();
        if !removed {
            return Err(StoreError::NotFound(format!("Card {key}")));
        }
        Ok(())
    }

    fn mark_orphaned_secret(&mut self, path: &str) -> StoreResult<()> {
        let mut table = self.txn.open_table(ORPHANED_SECRETS)?;
        table.insert(path, Utc::now().timestamp())?;
        Ok(())
    }

    fn clear_orphaned_secret(&mut self, path: &str) -> StoreResult<()> {
        let mut table = self.txn.open_table(ORPHANED_SECRETS)?;
        table.remove(path)?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
