// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::cards::{BatchUpdater, CardService};
use crate::keys::KeysProvider;
use crate::storage::CardStore;

#[derive(Clone)]
pub struct AppState {
    pub cards: Arc<CardService>,
    pub batch: BatchUpdater,
    pub keys: KeysProvider,
    pub verifier: TokenVerifier,
    /// Read access for health checks
    pub store: Arc<dyn CardStore>,
}

impl AppState {
    pub fn new(
        cards: Arc<CardService>,
        keys: KeysProvider,
        verifier: TokenVerifier,
        store: Arc<dyn CardStore>,
    ) -> Self {
        Self {
            batch: BatchUpdater::new(cards.clone()),
            cards,
            keys,
            verifier,
            store,
        }
    }
}
