// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching.
//!
//! ## Security
//!
//! - The key set is fetched again for every verification; nothing is cached
//! - Only RSA signing keys are accepted
//! - Keys published for encryption (`"use": "enc"`) are never used to verify

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::DecodingKey;

use super::error::AuthError;

/// JWKS request timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the identity provider's current signing keys.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// Keycloak certs endpoint for a realm.
pub fn certs_url(issuer_base_url: &str, realm: &str) -> String {
    format!(
        "{}/realms/{realm}/protocol/openid-connect/certs",
        issuer_base_url.trim_end_matches('/')
    )
}

/// Fetches the key set of a Keycloak realm over HTTP.
#[derive(Clone)]
pub struct HttpKeySetFetcher {
    certs_url: String,
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// Create a fetcher for `{issuer_base_url}/realms/{realm}`.
    pub fn new(issuer_base_url: &str, realm: &str) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::InternalError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            certs_url: certs_url(issuer_base_url, realm),
            client,
        })
    }

    pub fn certs_url(&self) -> &str {
        &self.certs_url
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.certs_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))
    }
}

/// Find the signing key with the given ID and build a decoding key from it.
pub fn find_decoding_key(jwks: &JwkSet, kid: &str) -> Result<DecodingKey, AuthError> {
    let jwk = jwks
        .keys
        .iter()
        .filter(|k| k.common.public_key_use != Some(PublicKeyUse::Encryption))
        .find(|k| k.common.key_id.as_deref() == Some(kid))
        .ok_or(AuthError::NoMatchingKey)?;

    jwk_to_decoding_key(jwk)
}

/// Convert an RSA JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}"))),
        _ => Err(AuthError::NoMatchingKey),
    }
}
