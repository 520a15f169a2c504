// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vault HTTP client.
//!
//! A thin wrapper over the Vault HTTP API that authenticates with a static
//! token and maps status codes onto [`VaultError`]. The transit and KV
//! engines are implemented on top of it in `transit.rs` and `secrets.rs`.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::error::{VaultError, VaultResult};

/// Header carrying the Vault token.
const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, e.g. `https://vault.internal:8200`
    pub addr: String,
    /// Token sent with every request
    pub token: String,
    /// Mount point of the transit secrets engine
    pub transit_mount: String,
    /// Mount point of the KV v2 secrets engine
    pub kv_mount: String,
    /// Request timeout
    pub timeout: Duration,
}

impl VaultConfig {
    /// Create a configuration with the default `transit` and `secret` mounts.
    pub fn new(addr: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            token: token.into(),
            transit_mount: "transit".to_string(),
            kv_mount: "secret".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the transit engine mount.
    #[must_use]
    pub fn with_transit_mount(mut self, mount: impl Into<String>) -> Self {
        self.transit_mount = mount.into();
        self
    }

    /// Override the KV engine mount.
    #[must_use]
    pub fn with_kv_mount(mut self, mount: impl Into<String>) -> Self {
        self.kv_mount = mount.into();
        self
    }
}

/// Vault client shared by the transit and KV engines.
#[derive(Clone)]
pub struct VaultClient {
    config: VaultConfig,
    http: Client,
}

impl VaultClient {
    /// Create a new Vault client.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Send a request and map non-success statuses to errors.
    #[instrument(skip(self, body))]
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> VaultResult<Response> {
        let url = format!("{}/v1/{}", self.config.addr.trim_end_matches('/'), path);
        debug!(path, "Vault request");

        let mut request = self
            .http
            .request(method, &url)
            .header(VAULT_TOKEN_HEADER, &self.config.token);

        if let Some(b) = body {
            request = request.json(&b);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VaultError::unavailable(e.to_string()))?;

        let status = response.status();
        match status.as_u16() {
            404 => Err(VaultError::NotFound(path.to_string())),
            403 => Err(VaultError::PermissionDenied(path.to_string())),
            429 => Err(VaultError::RateLimited),
            s if s >= 500 => {
                let text = response.text().await.unwrap_or_default();
                Err(VaultError::unavailable(format!("Status {status}: {text}")))
            }
            _ if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                Err(VaultError::unexpected(format!("Status {status}: {text}")))
            }
            _ => Ok(response),
        }
    }

    /// Send a request and decode the JSON response body.
    pub(super) async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> VaultResult<T> {
        let response = self.send(method, path, body).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request whose response body is irrelevant (often `204`).
    pub(super) async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> VaultResult<()> {
        self.send(method, path, body).await?;
        Ok(())
    }
}
