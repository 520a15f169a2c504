// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault Integration
//!
//! The sensitive half of every card lives in HashiCorp Vault:
//!
//! - the **transit** engine decrypts client-side ciphertexts and owns the
//!   per-user RSA keys (`transit.rs`)
//! - the **KV v2** engine stores the ciphertext under a deterministic path
//!   (`secrets.rs`)
//!
//! Both are expressed as traits so the card service can be exercised without
//! a running Vault.

pub mod client;
pub mod error;
pub mod secrets;
pub mod transit;

pub use client::{VaultClient, VaultConfig};
pub use error::{VaultError, VaultResult};
pub use secrets::{SecretPayload, SecretsStore};
pub use transit::{PublicKeyMaterial, TransitEncryption, CIPHERTEXT_PREFIX};
