// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-user transit key provisioning.
//!
//! Clients encrypt card numbers with the public half of their own transit
//! key before calling `POST /v1/cards`. The key is named after the internal
//! user ID, which is also the key the card service decrypts with.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::vault::{TransitEncryption, VaultError, VaultResult};

#[derive(Clone)]
pub struct KeysProvider {
    transit: Arc<dyn TransitEncryption>,
}

impl KeysProvider {
    pub fn new(transit: Arc<dyn TransitEncryption>) -> Self {
        Self { transit }
    }

    /// Create the caller's transit key and return the PEM public key of its
    /// latest version.
    #[instrument(skip(self))]
    pub async fn create_key(&self, user_id: &Uuid) -> VaultResult<String> {
        let key_id = user_id.to_string();
        self.transit.create_key(&key_id).await?;

        let material = self.transit.public_key(&key_id).await?;
        let public_key = material
            .latest()
            .ok_or_else(|| VaultError::unexpected(format!("no public key for {key_id}")))?
            .to_string();

        info!(version = material.latest_version, "Transit key provisioned");
        Ok(public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransit;

    #[tokio::test]
    async fn creates_key_named_after_user() {
        let transit = Arc::new(FakeTransit::new());
        let provider = KeysProvider::new(transit.clone());
        let user = Uuid::new_v4();

        let pem = provider.create_key(&user).await.unwrap();

        assert!(transit.has_key(&user.to_string()));
        assert_eq!(pem, format!("PEM for {user}"));
    }

    #[tokio::test]
    async fn creation_failure_propagates() {
        let provider = KeysProvider::new(Arc::new(FakeTransit::new().failing_key_creation()));
        let err = provider.create_key(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VaultError::Unavailable(_)));
    }
}
