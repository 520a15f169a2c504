// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! KV v2 secrets engine.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::client::VaultClient;
use super::error::{VaultError, VaultResult};

/// Secret stored for every tokenized card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretPayload {
    /// Transit ciphertext of the full card number, exactly as submitted
    pub pan: String,
}

/// Durable store for opaque secret payloads, addressed by path.
#[async_trait]
pub trait SecretsStore: Send + Sync {
    /// Write (or overwrite) the secret at `path`.
    async fn put(&self, path: &str, payload: &SecretPayload) -> VaultResult<()>;

    /// Delete the secret at `path`. Deleting a missing secret succeeds.
    async fn delete(&self, path: &str) -> VaultResult<()>;
}

#[async_trait]
impl SecretsStore for VaultClient {
    #[instrument(skip(self, payload))]
    async fn put(&self, path: &str, payload: &SecretPayload) -> VaultResult<()> {
        let full_path = format!("{}/data/{path}", self.config().kv_mount);
        let body = serde_json::json!({ "data": payload });
        self.request_empty(Method::POST, &full_path, Some(body)).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> VaultResult<()> {
        let full_path = format!("{}/data/{path}", self.config().kv_mount);
        match self.request_empty(Method::DELETE, &full_path, None).await {
            Err(VaultError::NotFound(_)) => Ok(()),
            other => other,
        }
    }
}
