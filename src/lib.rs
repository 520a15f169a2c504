// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card Vault - Card Tokenization Service
//!
//! Clients encrypt card numbers with a per-user transit key. The service
//! decrypts them only long enough to validate the number, keeps the last
//! four digits next to the card holder in an embedded database, and stores
//! the untouched ciphertext in Vault's KV engine.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification against the identity provider's JWKS
//! - `cards` - Card number validation, tokenization and batch updates
//! - `keys` - Per-user transit key provisioning
//! - `reaper` - Background cleanup of secrets left behind by failed deletes
//! - `storage` - Embedded relational store (redb)
//! - `vault` - Vault transit and KV clients

pub mod api;
pub mod auth;
pub mod cards;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod reaper;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod vault;

#[cfg(test)]
mod test_support;
