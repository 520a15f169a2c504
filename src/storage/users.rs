// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository: maps identity-provider subjects to internal users.
//!
//! Users are keyed by the `sub` claim of the identity provider. Each one
//! gets an internal UUID that owns cards and names its transit key.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::database::{Database, StoreResult, USERS};
use crate::auth::{CallerIdentity, IdentityResolver};

/// User record stored in the relational store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Internal user ID
    pub id: Uuid,
    /// Subject assigned by the identity provider
    pub external_id: String,
    /// Display name, if known
    pub username: Option<String>,
    /// Email address, if known
    pub email: Option<String>,
    /// When the user was registered
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for CallerIdentity {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.id,
            subject: user.external_id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Repository for user records.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    /// Create a new UserRepository over a shared database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Look up a user by identity-provider subject.
    pub fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.inner().begin_read()?;
        let table = read_txn.open_table(USERS)?;
        let existing = table.get(external_id)?;
        match existing {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Register a subject, or return the existing user if already known.
    pub fn register(
        &self,
        external_id: &str,
        username: Option<String>,
        email: Option<String>,
    ) -> StoreResult<StoredUser> {
        if let Some(existing) = self.find_by_external_id(external_id)? {
            return Ok(existing);
        }

        let user = StoredUser {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            username,
            email,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&user)?;

        let write_txn = self.db.inner().begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            table.insert(external_id, json.as_slice())?;
        }
        write_txn.commit()?;

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(user)
    }
}

#[async_trait]
impl IdentityResolver for UserRepository {
    async fn find_by_external_subject(&self, subject: &str) -> StoreResult<Option<CallerIdentity>> {
        Ok(self.find_by_external_id(subject)?.map(CallerIdentity::from))
    }
}
