// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! Everything under `/v1` requires a bearer token; health probes and the
//! API docs are public.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    models::{
        BatchUpdate, BatchUpdateStatus, Card, CreateCardRequest, KeyResponse, UpdateCardRequest,
        UpdateStatus, UserResponse,
    },
    state::AppState,
};

pub mod cards;
pub mod health;
pub mod keys;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/cards", post(cards::create_card))
        .route("/cards/batch", put(cards::batch_update_cards))
        .route(
            "/cards/{card_id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .route("/keys", post(keys::create_key))
        .route("/users/me", get(users::get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Card Vault",
        description = "Card tokenization backed by Vault transit encryption"
    ),
    paths(
        health::health,
        health::liveness,
        cards::create_card,
        cards::get_card,
        cards::update_card,
        cards::delete_card,
        cards::batch_update_cards,
        keys::create_key,
        users::get_current_user
    ),
    components(
        schemas(
            Card,
            CreateCardRequest,
            UpdateCardRequest,
            BatchUpdate,
            BatchUpdateStatus,
            UpdateStatus,
            KeyResponse,
            UserResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Cards", description = "Card tokenization"),
        (name = "Keys", description = "Per-user transit keys"),
        (name = "Users", description = "Authenticated user")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
