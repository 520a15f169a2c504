// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the on-disk database and the Vault secret layout.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Default base directory for persistent storage.
pub const DATA_ROOT: &str = "/data";

/// File name of the embedded relational database.
const DATABASE_FILE: &str = "card-vault.redb";

/// Prefix under which card ciphertexts live in the secrets store.
const CARD_SECRETS_PREFIX: &str = "secrets/cards";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the redb database file.
    pub fn database(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }
}

/// Deterministic secrets-store path for a card's ciphertext.
///
/// Layout: `secrets/cards/{owner_id}/{card_id}`.
pub fn secret_path(owner_id: &Uuid, card_id: &Uuid) -> String {
    format!("{CARD_SECRETS_PREFIX}/{owner_id}/{card_id}")
}
