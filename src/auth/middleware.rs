// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification and the authentication middleware.
//!
//! ## Pipeline
//!
//! 1. Read `Authorization: Bearer <token>`
//! 2. Decode the token header; it must name a key (`kid`) and use RSA
//! 3. Fetch the realm's key set and pick the key with that `kid`
//! 4. Verify signature, expiry and (when configured) issuer and audience
//! 5. Resolve the `sub` claim to a registered user
//!
//! Any failure rejects the request; the handler never runs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/cards", post(create_card))
//!     .route_layer(axum::middleware::from_fn_with_state(verifier, require_auth));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::{debug, warn};

use super::claims::{CallerIdentity, UserClaims};
use super::identity::IdentityResolver;
use super::jwks::{find_decoding_key, KeySetFetcher};
use super::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies bearer tokens and resolves them to a [`CallerIdentity`].
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<dyn KeySetFetcher>,
    identities: Arc<dyn IdentityResolver>,
    /// Expected issuer (optional)
    issuer: Option<String>,
    /// Expected audience (optional)
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn KeySetFetcher>, identities: Arc<dyn IdentityResolver>) -> Self {
        Self {
            keys,
            identities,
            issuer: None,
            audience: None,
        }
    }

    /// Set the expected issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the expected audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Run the full pipeline on the value of an `Authorization` header.
    pub async fn authenticate(
        &self,
        authorization: Option<&HeaderValue>,
    ) -> Result<CallerIdentity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingAuthHeader)?;
        let token = bearer_token(header)?;
        let claims = self.verify_token(token).await?;

        self.identities
            .find_by_external_subject(&claims.sub)
            .await
            .map_err(|e| AuthError::InternalError(format!("identity lookup failed: {e}")))?
            .ok_or(AuthError::UnknownUser)
    }

    /// Validate a JWT and return its claims.
    pub async fn verify_token(&self, token: &str) -> Result<UserClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            return Err(AuthError::UnsupportedAlgorithm);
        }

        let jwks = self.keys.fetch().await?;
        let decoding_key = find_decoding_key(&jwks, &kid)?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }
        if let Some(aud) = &self.audience {
            validation.set_audience(&[aud]);
        } else {
            validation.validate_aud = false;
        }

        let token_data =
            decode::<UserClaims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AuthError::MalformedToken);
        }
        Ok(token_data.claims)
    }
}

/// Extract the token from a `Bearer <token>` header value.
fn bearer_token(value: &HeaderValue) -> Result<&str, AuthError> {
    let auth_str = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Authentication middleware function.
///
/// On success the [`CallerIdentity`] is added to the request extensions,
/// where the `Auth` extractor picks it up.
pub async fn require_auth(
    State(verifier): State<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request.headers().get(AUTHORIZATION).cloned();

    match verifier.authenticate(authorization.as_ref()).await {
        Ok(identity) => {
            debug!(user_id = %identity.user_id, "Request authenticated");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            warn!(
                path = %request.uri().path(),
                error_code = e.error_code(),
                "Request rejected"
            );
            e.into_response()
        }
    }
}
