// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for card records.
//!
//! A record owned by somebody else is indistinguishable from a record that
//! does not exist: both collapse to `None`, so callers can only ever report
//! "not found" and never leak the existence of another user's card.

use uuid::Uuid;

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's internal user ID.
    fn owner_id(&self) -> &Uuid;
}

/// Extension trait that filters a lookup result down to the caller's records.
pub trait OwnershipCheck<T> {
    /// Keep the resource only if `owner_id` owns it.
    fn owned_by(self, owner_id: &Uuid) -> Option<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn owned_by(self, owner_id: &Uuid) -> Option<T> {
        self.filter(|resource| resource.owner_id() == owner_id)
    }
}
