// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transit secrets engine (encryption as a service).
//!
//! The service never holds key material. Each user has one RSA transit key,
//! named after their internal user ID; clients encrypt card numbers with its
//! public half and the service asks Vault to decrypt.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use super::client::VaultClient;
use super::error::{VaultError, VaultResult};

/// Version marker Vault expects in front of transit ciphertexts.
pub const CIPHERTEXT_PREFIX: &str = "vault:v1:";

/// Key type provisioned for every user.
const TRANSIT_KEY_TYPE: &str = "rsa-2048";

/// Public key material of a transit key, one entry per key version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    /// Latest key version
    pub latest_version: u64,
    /// Version → PEM-encoded public key
    pub keys: BTreeMap<u64, String>,
}

impl PublicKeyMaterial {
    /// Public key of the latest version.
    pub fn latest(&self) -> Option<&str> {
        self.keys.get(&self.latest_version).map(String::as_str)
    }
}

/// Remote transit encryption service.
#[async_trait]
pub trait TransitEncryption: Send + Sync {
    /// Decrypt `ciphertext` with the named key. Returns Vault's plaintext,
    /// which is base64-encoded.
    async fn decrypt(&self, ciphertext: &str, key_id: &str) -> VaultResult<String>;

    /// Create an asymmetric key.
    async fn create_key(&self, key_id: &str) -> VaultResult<()>;

    /// Read the public key material of a key.
    async fn public_key(&self, key_id: &str) -> VaultResult<PublicKeyMaterial>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct DecryptData {
    plaintext: Option<String>,
}

#[derive(Deserialize)]
struct KeyData {
    latest_version: u64,
    #[serde(default)]
    keys: BTreeMap<String, KeyVersion>,
}

#[derive(Deserialize)]
struct KeyVersion {
    public_key: Option<String>,
}

#[async_trait]
impl TransitEncryption for VaultClient {
    #[instrument(skip(self, ciphertext))]
    async fn decrypt(&self, ciphertext: &str, key_id: &str) -> VaultResult<String> {
        let path = format!("{}/decrypt/{key_id}", self.config().transit_mount);
        let body = serde_json::json!({ "ciphertext": ciphertext });

        let response: DataEnvelope<DecryptData> =
            self.request_json(Method::POST, &path, Some(body)).await?;

        response
            .data
            .plaintext
            .ok_or_else(|| VaultError::unexpected("transit decrypt returned no plaintext"))
    }

    #[instrument(skip(self))]
    async fn create_key(&self, key_id: &str) -> VaultResult<()> {
        let path = format!("{}/keys/{key_id}", self.config().transit_mount);
        let body = serde_json::json!({
            "type": TRANSIT_KEY_TYPE,
            "exportable": true,
            "allow_plaintext_backup": false,
        });

        self.request_empty(Method::POST, &path, Some(body)).await
    }

    #[instrument(skip(self))]
    async fn public_key(&self, key_id: &str) -> VaultResult<PublicKeyMaterial> {
        let path = format!("{}/keys/{key_id}", self.config().transit_mount);
        let response: DataEnvelope<KeyData> = self.request_json(Method::GET, &path, None).await?;

        let mut keys = BTreeMap::new();
        for (version, entry) in response.data.keys {
            let version: u64 = version
                .parse()
                .map_err(|_| VaultError::unexpected(format!("invalid key version {version}")))?;
            if let Some(public_key) = entry.public_key {
                keys.insert(version, public_key);
            }
        }

        let material = PublicKeyMaterial {
            latest_version: response.data.latest_version,
            keys,
        };
        if material.latest().is_none() {
            return Err(VaultError::unexpected(format!(
                "no public key for latest version of {key_id}"
            )));
        }
        Ok(material)
    }
}
