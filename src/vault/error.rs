// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vault error types.

use thiserror::Error;

/// Errors returned by the transit and KV engines.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Vault server unavailable or returned a server error
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// Nothing exists at the requested path
    #[error("Vault path not found: {0}")]
    NotFound(String),

    /// Token lacks the policy for this path
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Rate limited
    #[error("Rate limited")]
    RateLimited,

    /// Request rejected or response missing expected fields
    #[error("Unexpected Vault response: {0}")]
    UnexpectedResponse(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an unexpected-response error.
    #[must_use]
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        assert_eq!(
            VaultError::NotFound("transit/keys/abc".into()).to_string(),
            "Vault path not found: transit/keys/abc"
        );
        assert_eq!(
            VaultError::unexpected("missing plaintext").to_string(),
            "Unexpected Vault response: missing plaintext"
        );
    }
}
