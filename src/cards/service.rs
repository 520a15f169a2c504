// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card tokenization service.
//!
//! Relational-store work is done in synchronous helpers so that a write
//! transaction is always committed or dropped before the next `.await`.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::pan::{decode_plaintext, detect_network, residue};
use super::CardError;
use crate::models::Card;
use crate::storage::{secret_path, CardStore, OwnershipCheck, StoreResult, StoredCard};
use crate::vault::{SecretPayload, SecretsStore, TransitEncryption, CIPHERTEXT_PREFIX};

/// Input of [`CardService::create`].
#[derive(Debug, Clone)]
pub struct NewCard {
    pub card_holder: String,
    /// Base64 transit ciphertext, without the `vault:v1:` prefix
    pub encrypted_pan: String,
    /// Authenticated caller; the transit key is named after it
    pub owner_id: Uuid,
}

/// Address of an existing card on behalf of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRef {
    pub id: Uuid,
    pub owner_id: Uuid,
}

impl CardRef {
    pub fn new(id: Uuid, owner_id: Uuid) -> Self {
        Self { id, owner_id }
    }
}

/// Orchestrates the transit engine, the relational store and the secrets
/// store for every card operation.
#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn CardStore>,
    transit: Arc<dyn TransitEncryption>,
    secrets: Arc<dyn SecretsStore>,
}

impl CardService {
    pub fn new(
        store: Arc<dyn CardStore>,
        transit: Arc<dyn TransitEncryption>,
        secrets: Arc<dyn SecretsStore>,
    ) -> Self {
        Self {
            store,
            transit,
            secrets,
        }
    }

    /// Tokenize a card.
    ///
    /// Decrypts the submitted ciphertext with the owner's transit key,
    /// validates the card number, stores the 4-digit residue and writes the
    /// untouched ciphertext to the secrets store.
    #[instrument(skip(self, new_card), fields(owner_id = %new_card.owner_id))]
    pub async fn create(&self, new_card: NewCard) -> Result<Card, CardError> {
        validate_holder(&new_card.card_holder)?;

        let ciphertext = format!("{CIPHERTEXT_PREFIX}{}", new_card.encrypted_pan);
        let plaintext = self
            .transit
            .decrypt(&ciphertext, &new_card.owner_id.to_string())
            .await
            .map_err(CardError::Transit)?;

        let pan = decode_plaintext(&plaintext)?;
        let network = detect_network(&pan).ok_or(CardError::InvalidPan)?;
        let record = StoredCard::new(
            Uuid::new_v4(),
            new_card.card_holder,
            residue(&pan),
            new_card.owner_id,
        );
        drop(pan);

        self.insert_record(&record)?;

        let path = secret_path(&record.owner_id, &record.id);
        let payload = SecretPayload {
            pan: new_card.encrypted_pan,
        };
        if let Err(e) = self.secrets.put(&path, &payload).await {
            warn!(card_id = %record.id, error = %e, "Secret write failed, removing card row");
            if let Err(rollback) = self.remove_record(&record.id) {
                error!(
                    card_id = %record.id,
                    error = %rollback,
                    "Failed to remove card row after secret write failure"
                );
            }
            return Err(CardError::Secrets(e));
        }

        info!(card_id = %record.id, network = ?network, "Card tokenized");
        Ok(record.into())
    }

    /// Fetch a card owned by the caller.
    ///
    /// A missing card and a card owned by someone else are both `NotFound`.
    #[instrument(skip(self), fields(card_id = %card.id))]
    pub async fn get(&self, card: CardRef) -> Result<Card, CardError> {
        let record = self
            .store
            .get(&card.id)?
            .owned_by(&card.owner_id)
            .ok_or(CardError::NotFound)?;
        Ok(record.into())
    }

    /// Replace the holder name of a card owned by the caller.
    #[instrument(skip(self, card_holder), fields(card_id = %card.id))]
    pub async fn update(&self, card: CardRef, card_holder: &str) -> Result<Card, CardError> {
        validate_holder(card_holder)?;

        let mut tx = self.store.begin()?;
        let mut record = tx
            .get(&card.id)?
            .owned_by(&card.owner_id)
            .ok_or(CardError::NotFound)?;
        tx.update_holder(&card.id, card_holder)?;
        tx.commit()?;

        record.card_holder = card_holder.to_string();
        Ok(record.into())
    }

    /// Delete a card owned by the caller, together with its secret.
    ///
    /// The row is gone once this returns, even on error: a failed secret
    /// purge is left in the orphan ledger for
    /// [`reconcile_orphaned_secrets`](Self::reconcile_orphaned_secrets).
    #[instrument(skip(self), fields(card_id = %card.id))]
    pub async fn delete(&self, card: CardRef) -> Result<(), CardError> {
        let path = self.detach_record(&card)?;

        if let Err(e) = self.secrets.delete(&path).await {
            warn!(path = %path, error = %e, "Secret purge failed, left for reconciliation");
            return Err(CardError::Secrets(e));
        }

        if let Err(e) = self.clear_orphan(&path) {
            warn!(path = %path, error = %e, "Failed to clear purged secret from orphan ledger");
        }
        info!("Card deleted");
        Ok(())
    }

    /// Retry every pending secret purge. Returns how many were purged.
    pub async fn reconcile_orphaned_secrets(&self) -> Result<usize, CardError> {
        let pending = self.store.orphaned_secrets()?;
        let mut purged = 0;

        for path in pending {
            match self.secrets.delete(&path).await {
                Ok(()) => match self.clear_orphan(&path) {
                    Ok(()) => purged += 1,
                    Err(e) => warn!(path = %path, error = %e, "Failed to clear orphan ledger entry"),
                },
                Err(e) => warn!(path = %path, error = %e, "Orphaned secret still not purged"),
            }
        }

        if purged > 0 {
            info!(purged, "Reconciled orphaned secrets");
        }
        Ok(purged)
    }

    fn insert_record(&self, record: &StoredCard) -> StoreResult<()> {
        let mut tx = self.store.begin()?;
        tx.insert(record)?;
        tx.commit()
    }

    fn remove_record(&self, id: &Uuid) -> StoreResult<()> {
        let mut tx = self.store.begin()?;
        tx.remove(id)?;
        tx.commit()
    }

    /// Remove the row and record its secret path as pending purge.
    fn detach_record(&self, card: &CardRef) -> Result<String, CardError> {
        let mut tx = self.store.begin()?;
        let record = tx
            .get(&card.id)?
            .owned_by(&card.owner_id)
            .ok_or(CardError::NotFound)?;

        let path = secret_path(&record.owner_id, &record.id);
        tx.remove(&record.id)?;
        tx.mark_orphaned_secret(&path)?;
        tx.commit()?;
        Ok(path)
    }

    fn clear_orphan(&self, path: &str) -> StoreResult<()> {
        let mut tx = self.store.begin()?;
        tx.clear_orphaned_secret(path)?;
        tx.commit()
    }
}

fn validate_holder(card_holder: &str) -> Result<(), CardError> {
    if card_holder.trim().is_empty() {
        return Err(CardError::InvalidHolder);
    }
    Ok(())
}
