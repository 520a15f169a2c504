// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! Use the `Auth` extractor in handlers behind [`require_auth`]:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is CallerIdentity
//! }
//! ```
//!
//! [`require_auth`]: super::middleware::require_auth

use axum::{extract::FromRequestParts, http::request::Parts};

use super::CallerIdentity;
use crate::error::ApiError;

/// Extractor for the identity established by the auth middleware.
///
/// A handler reached without an identity is mounted outside the protected
/// router; that is a server bug, so the rejection is a `500`.
pub struct Auth(pub CallerIdentity);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| {
                tracing::error!(path = %parts.uri.path(), "Handler reached without caller identity");
                ApiError::internal("internal server error")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use uuid::Uuid;

    #[tokio::test]
    async fn auth_extractor_reads_extensions() {
        let identity = CallerIdentity {
            user_id: Uuid::new_v4(),
            subject: "kc-ada".to_string(),
            username: None,
            email: None,
        };
        let mut parts = Request::builder()
            .uri("/v1/cards")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts.extensions.insert(identity.clone());

        let Auth(user) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user, identity);
    }

    #[tokio::test]
    async fn missing_identity_is_internal_error() {
        let mut parts = Request::builder()
            .uri("/v1/cards")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let err = Auth::from_request_parts(&mut parts, &()).await.err().unwrap();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
