// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## The `pan` Field
//!
//! Clients never send a card number in the clear. On requests the `pan`
//! field carries the base64 transit ciphertext produced with the caller's
//! public key (see `POST /v1/keys`), without the `vault:v1:` prefix. On
//! responses it carries only the first four digits.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::StoredCard;

// =============================================================================
// Card Models
// =============================================================================

/// A tokenized card.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Card {
    /// Unique card identifier.
    pub id: Uuid,
    /// Name printed on the card.
    pub card_holder: String,
    /// First four digits of the card number.
    pub pan: String,
    /// Internal ID of the owning user.
    pub user_id: Uuid,
}

impl From<StoredCard> for Card {
    fn from(record: StoredCard) -> Self {
        Self {
            id: record.id,
            card_holder: record.card_holder,
            pan: record.pan_residue,
            user_id: record.owner_id,
        }
    }
}

/// Request to tokenize a new card.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCardRequest {
    /// Name printed on the card.
    pub card_holder: String,
    /// Base64 transit ciphertext of the card number.
    pub pan: String,
}

/// Request to rename the holder of a card.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateCardRequest {
    pub card_holder: String,
}

// =============================================================================
// Batch Models
// =============================================================================

/// One item of a batch holder update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BatchUpdate {
    /// Card to update.
    pub id: Uuid,
    /// New holder name.
    pub card_holder: String,
}

/// Outcome of one batch item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Succeeded,
    Failed,
}

/// Per-item result of a batch update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BatchUpdateStatus {
    /// Card the status refers to.
    pub card: Uuid,
    pub status: UpdateStatus,
}

impl BatchUpdateStatus {
    pub fn succeeded(card: Uuid) -> Self {
        Self {
            card,
            status: UpdateStatus::Succeeded,
        }
    }

    pub fn failed(card: Uuid) -> Self {
        Self {
            card,
            status: UpdateStatus::Failed,
        }
    }
}

// =============================================================================
// Key Models
// =============================================================================

/// Public half of a freshly provisioned transit key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct KeyResponse {
    /// PEM-encoded RSA public key (latest version).
    pub public_key: String,
}

// =============================================================================
// User Models
// =============================================================================

/// The authenticated caller, as resolved from the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    /// Internal user ID (owner of cards and transit key).
    pub user_id: Uuid,
    /// Subject claim issued by the identity provider.
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_status_serializes_lowercase() {
        let status = BatchUpdateStatus::failed(Uuid::nil());
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(
            serde_json::to_value(UpdateStatus::Succeeded).unwrap(),
            json!("succeeded")
        );
    }

    #[test]
    fn card_from_record_exposes_residue_only() {
        let owner = Uuid::new_v4();
        let record = StoredCard::new(Uuid::new_v4(), "Ada", "4111", owner);
        let card = Card::from(record.clone());
        assert_eq!(card.id, record.id);
        assert_eq!(card.user_id, owner);
        assert_eq!(card.pan, "4111");
    }
}
