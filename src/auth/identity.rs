// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mapping from token subjects to internal users.

use async_trait::async_trait;

use super::claims::CallerIdentity;
use crate::storage::StoreResult;

/// Looks up the internal user an external subject belongs to.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` when the subject is not registered.
    async fn find_by_external_subject(&self, subject: &str) -> StoreResult<Option<CallerIdentity>>;
}
