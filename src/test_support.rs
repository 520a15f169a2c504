// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AuthError, CallerIdentity, IdentityResolver, KeySetFetcher, TokenVerifier};
use crate::cards::CardService;
use crate::keys::KeysProvider;
use crate::state::AppState;
use crate::storage::{
    CardStore, CardTransaction, Database, StoreError, StoreResult, StoredCard, UserRepository,
};
use crate::vault::{
    PublicKeyMaterial, SecretPayload, SecretsStore, TransitEncryption, VaultError, VaultResult,
    CIPHERTEXT_PREFIX,
};

pub fn temp_database() -> (Arc<Database>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("test.redb")).unwrap();
    (Arc::new(db), dir)
}

// =============================================================================
// Transit
// =============================================================================

/// Transit engine that "decrypts" from a fixed table.
#[derive(Default)]
pub struct FakeTransit {
    plaintexts: Mutex<HashMap<String, String>>,
    keys: Mutex<HashMap<String, String>>,
    decrypt_calls: Mutex<Vec<(String, String)>>,
    fail_create: AtomicBool,
}

impl FakeTransit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ciphertext that decrypts to `pan`.
    pub fn with_card(self, ciphertext: &str, pan: &str) -> Self {
        self.with_plaintext(ciphertext, &STANDARD.encode(pan))
    }

    /// Register a ciphertext that decrypts to a raw transit plaintext.
    pub fn with_plaintext(self, ciphertext: &str, plaintext: &str) -> Self {
        self.plaintexts
            .lock()
            .unwrap()
            .insert(format!("{CIPHERTEXT_PREFIX}{ciphertext}"), plaintext.to_string());
        self
    }

    pub fn failing_key_creation(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub fn decrypt_calls(&self) -> Vec<(String, String)> {
        self.decrypt_calls.lock().unwrap().clone()
    }

    pub fn has_key(&self, key_id: &str) -> bool {
        self.keys.lock().unwrap().contains_key(key_id)
    }
}

#[async_trait]
impl TransitEncryption for FakeTransit {
    async fn decrypt(&self, ciphertext: &str, key_id: &str) -> VaultResult<String> {
        self.decrypt_calls
            .lock()
            .unwrap()
            .push((ciphertext.to_string(), key_id.to_string()));
        self.plaintexts
            .lock()
            .unwrap()
            .get(ciphertext)
            .cloned()
            .ok_or_else(|| VaultError::unexpected("Status 400: invalid ciphertext"))
    }

    async fn create_key(&self, key_id: &str) -> VaultResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(VaultError::unavailable("sealed"));
        }
        self.keys
            .lock()
            .unwrap()
            .insert(key_id.to_string(), format!("PEM for {key_id}"));
        Ok(())
    }

    async fn public_key(&self, key_id: &str) -> VaultResult<PublicKeyMaterial> {
        let pem = self
            .keys
            .lock()
            .unwrap()
            .get(key_id)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(key_id.to_string()))?;
        Ok(PublicKeyMaterial {
            latest_version: 1,
            keys: [(1, pem)].into_iter().collect(),
        })
    }
}

// =============================================================================
// Secrets
// =============================================================================

/// KV store held in a map, with switchable failures.
#[derive(Default)]
pub struct FakeSecrets {
    secrets: Mutex<HashMap<String, SecretPayload>>,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
}

impl FakeSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<SecretPayload> {
        self.secrets.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().unwrap().len()
    }

    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SecretsStore for FakeSecrets {
    async fn put(&self, path: &str, payload: &SecretPayload) -> VaultResult<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(VaultError::unavailable("Status 503: sealed"));
        }
        self.secrets
            .lock()
            .unwrap()
            .insert(path.to_string(), payload.clone());
        Ok(())
    }

    async fn delete(&self, path: &str) -> VaultResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(VaultError::unavailable("Status 503: sealed"));
        }
        self.secrets.lock().unwrap().remove(path);
        Ok(())
    }
}

// =============================================================================
// Relational store
// =============================================================================

/// Store whose transactions can never be opened.
pub struct BrokenStore;

impl CardStore for BrokenStore {
    fn begin(&self) -> StoreResult<Box<dyn CardTransaction>> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    fn get(&self, _id: &Uuid) -> StoreResult<Option<StoredCard>> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    fn count(&self) -> StoreResult<usize> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    fn orphaned_secrets(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Key ID the fixture signing key is published under.
pub const TEST_KID: &str = "test-key";

/// RSA key whose public half is in [`test_jwks`].
pub const SIGNING_KEY_PEM: &str = include_str!("auth/testdata/signing_key.pem");

/// RSA key that is not published anywhere.
pub const FOREIGN_KEY_PEM: &str = include_str!("auth/testdata/foreign_key.pem");

const SIGNING_KEY_MODULUS: &str = include_str!("auth/testdata/signing_key.n");

pub fn test_jwks_json() -> serde_json::Value {
    json!({
        "keys": [{
            "kid": TEST_KID,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": SIGNING_KEY_MODULUS.trim(),
            "e": "AQAB",
        }]
    })
}

pub fn test_jwks() -> JwkSet {
    serde_json::from_value(test_jwks_json()).unwrap()
}

/// Claims valid for the next hour.
pub fn test_claims(subject: &str) -> serde_json::Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": subject,
        "iat": now,
        "exp": now + 3600,
        "preferred_username": "ada",
    })
}

/// Sign `claims` with RS256.
pub fn sign_token(claims: &serde_json::Value, kid: Option<&str>, key_pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(key_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Serves the fixture key set.
pub struct StaticKeySet(pub JwkSet);

impl Default for StaticKeySet {
    fn default() -> Self {
        Self(test_jwks())
    }
}

#[async_trait]
impl KeySetFetcher for StaticKeySet {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        Ok(self.0.clone())
    }
}

/// Key set endpoint that is down.
pub struct FailingKeySet;

#[async_trait]
impl KeySetFetcher for FailingKeySet {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        Err(AuthError::JwksFetchError("connection refused".to_string()))
    }
}

/// Registered users keyed by subject.
#[derive(Default)]
pub struct StaticIdentities(HashMap<String, CallerIdentity>);

impl StaticIdentities {
    pub fn with(identity: CallerIdentity) -> Self {
        let mut map = HashMap::new();
        map.insert(identity.subject.clone(), identity);
        Self(map)
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentities {
    async fn find_by_external_subject(&self, subject: &str) -> StoreResult<Option<CallerIdentity>> {
        Ok(self.0.get(subject).cloned())
    }
}

// =============================================================================
// Application
// =============================================================================

/// Fully wired [`AppState`] over a temporary database and the fakes above.
///
/// Two users are registered: `kc-ada`, who owns the Visa fixture, and
/// `kc-eve`.
pub struct TestApp {
    pub state: AppState,
    pub transit: Arc<FakeTransit>,
    pub secrets: Arc<FakeSecrets>,
    users: UserRepository,
    _dir: tempfile::TempDir,
}

impl TestApp {
    pub const VISA_CIPHERTEXT: &'static str = "visa-ct";
    pub const INVALID_CIPHERTEXT: &'static str = "bogus-ct";
    pub const USER_SUBJECT: &'static str = "kc-ada";
    pub const STRANGER_SUBJECT: &'static str = "kc-eve";

    pub fn new() -> Self {
        let (db, dir) = temp_database();
        let users = UserRepository::new(db.clone());
        users
            .register(Self::USER_SUBJECT, Some("ada".into()), None)
            .unwrap();
        users.register(Self::STRANGER_SUBJECT, None, None).unwrap();

        let transit = Arc::new(
            FakeTransit::new()
                .with_card(Self::VISA_CIPHERTEXT, "4111111111111111")
                .with_card(Self::INVALID_CIPHERTEXT, "1234567890123456"),
        );
        let secrets = Arc::new(FakeSecrets::new());
        let cards = Arc::new(CardService::new(
            db.clone(),
            transit.clone(),
            secrets.clone(),
        ));
        let verifier = TokenVerifier::new(
            Arc::new(StaticKeySet::default()),
            Arc::new(users.clone()),
        );
        let state = AppState::new(cards, KeysProvider::new(transit.clone()), verifier, db);

        Self {
            state,
            transit,
            secrets,
            users,
            _dir: dir,
        }
    }

    fn identity(&self, subject: &str) -> CallerIdentity {
        self.users
            .find_by_external_id(subject)
            .unwrap()
            .map(CallerIdentity::from)
            .unwrap()
    }

    pub fn user(&self) -> CallerIdentity {
        self.identity(Self::USER_SUBJECT)
    }

    pub fn stranger(&self) -> CallerIdentity {
        self.identity(Self::STRANGER_SUBJECT)
    }

    /// Bearer header value for `subject`, signed with the published key.
    pub fn bearer(subject: &str) -> String {
        let token = sign_token(&test_claims(subject), Some(TEST_KID), SIGNING_KEY_PEM);
        format!("Bearer {token}")
    }
}
