// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the resolved caller identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserResponse;

/// Claims read from a Keycloak access token.
///
/// `exp` is mandatory; `iss` and `aud` are checked by `jsonwebtoken` when
/// an expected value is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject, the identity provider's user ID
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer (`{keycloak}/realms/{realm}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience, a string or a list of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The authenticated caller.
///
/// Inserted into request extensions by the auth middleware; every card
/// operation is scoped to `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Internal user ID
    pub user_id: Uuid,
    /// External subject the token was issued for
    pub subject: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl From<CallerIdentity> for UserResponse {
    fn from(identity: CallerIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            subject: identity.subject,
            username: identity.username,
            email: identity.email,
        }
    }
}
