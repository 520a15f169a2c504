// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relational Storage Module
//!
//! Holds the non-sensitive half of every tokenized card: its identifier,
//! holder name, owner, and the four-digit PAN residue. The full card number
//! never reaches this module; its ciphertext lives in the secrets store.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   card-vault.redb     # cards, users, orphaned_secrets tables
//! ```
//!
//! ## Transactions
//!
//! All writes go through an explicit [`CardTransaction`]. The secrets store
//! is not covered by these transactions; the card service pairs the two
//! stores with compensating actions instead.

pub mod database;
pub mod ownership;
pub mod paths;
pub mod repository;
pub mod users;

pub use database::{Database, StoreError, StoreResult};
pub use ownership::{OwnedResource, OwnershipCheck};
pub use paths::{secret_path, StoragePaths};
pub use repository::{CardStore, CardTransaction, StoredCard};
pub use users::{StoredUser, UserRepository};
