// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Card Tokenization
//!
//! Cards are split across two stores:
//!
//! - the relational store keeps the row (`id`, holder, first four digits,
//!   owner), see [`crate::storage`]
//! - the secrets store keeps the submitted transit ciphertext at
//!   `secrets/cards/{owner}/{card}`, see [`crate::vault`]
//!
//! The plaintext card number only exists in memory while it is validated.
//!
//! ## Consistency
//!
//! The two stores cannot share a transaction. Writes are ordered so that a
//! failure never leaves a readable row without its secret:
//!
//! - **create**: commit the row, then write the secret; if the secret write
//!   fails the row is deleted again
//! - **delete**: remove the row and record the secret path in the orphan
//!   ledger in one transaction, then purge the secret; a failed purge stays
//!   in the ledger until [`CardService::reconcile_orphaned_secrets`] succeeds

pub mod batch;
pub mod pan;
pub mod service;

pub use batch::{BatchUpdater, BATCH_WORKERS};
pub use pan::{detect_network, is_valid_card_number, CardNetwork};
pub use service::{CardRef, CardService, NewCard};

use crate::storage::StoreError;
use crate::vault::VaultError;

/// Card operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("invalid card number")]
    InvalidPan,

    #[error("card holder must not be empty")]
    InvalidHolder,

    #[error("malformed card payload: {0}")]
    Decode(String),

    #[error("card not found")]
    NotFound,

    #[error("transit error: {0}")]
    Transit(#[source] VaultError),

    #[error("secrets store error: {0}")]
    Secrets(#[source] VaultError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
