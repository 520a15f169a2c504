// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides Keycloak JWT authentication for the card API.
//!
//! ## Auth Flow
//!
//! 1. The client obtains an access token from the Keycloak realm
//! 2. The client sends `Authorization: Bearer <token>`
//! 3. The server:
//!    - Fetches the realm's JWKS via HTTP(S)
//!    - Verifies JWT signature, expiry, issuer, audience
//!    - Resolves the `sub` claim to a registered user
//!
//! ## Security
//!
//! - Only routes mounted on the public router skip authentication
//! - Every failure is fail-closed (`401`, or `500` when a dependency is down)
//! - JWKS is not cached; every verification fetches the current key set
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod jwks;
pub mod middleware;

pub use claims::{CallerIdentity, UserClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use identity::IdentityResolver;
pub use jwks::{HttpKeySetFetcher, KeySetFetcher};
pub use middleware::{require_auth, TokenVerifier};
