// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Card endpoints. Every operation is scoped to the authenticated caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::Auth,
    cards::{CardRef, NewCard},
    error::ApiError,
    models::{BatchUpdate, BatchUpdateStatus, Card, CreateCardRequest, UpdateCardRequest},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/cards",
    request_body = CreateCardRequest,
    tag = "Cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Card tokenized", body = Card),
        (status = 400, description = "Invalid card number or payload"),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Dependency failure")
    )
)]
pub async fn create_card(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let card = state
        .cards
        .create(NewCard {
            card_holder: request.card_holder,
            encrypted_pan: request.pan,
            owner_id: user.user_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

#[utoipa::path(
    get,
    path = "/v1/cards/{card_id}",
    params(("card_id" = Uuid, Path, description = "Card identifier")),
    tag = "Cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card found", body = Card),
        (status = 404, description = "No such card for this caller")
    )
)]
pub async fn get_card(
    Auth(user): Auth,
    Path(card_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Card>, ApiError> {
    let card = state.cards.get(CardRef::new(card_id, user.user_id)).await?;
    Ok(Json(card))
}

#[utoipa::path(
    put,
    path = "/v1/cards/{card_id}",
    params(("card_id" = Uuid, Path, description = "Card identifier")),
    request_body = UpdateCardRequest,
    tag = "Cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Holder updated"),
        (status = 400, description = "Empty holder name"),
        (status = 404, description = "No such card for this caller")
    )
)]
pub async fn update_card(
    Auth(user): Auth,
    Path(card_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCardRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .cards
        .update(CardRef::new(card_id, user.user_id), &request.card_holder)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/cards/{card_id}",
    params(("card_id" = Uuid, Path, description = "Card identifier")),
    tag = "Cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Card and secret deleted"),
        (status = 404, description = "No such card for this caller")
    )
)]
pub async fn delete_card(
    Auth(user): Auth,
    Path(card_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .cards
        .delete(CardRef::new(card_id, user.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rename the holders of several cards at once.
///
/// Always `200`; each item reports its own outcome.
#[utoipa::path(
    put,
    path = "/v1/cards/batch",
    request_body = [BatchUpdate],
    tag = "Cards",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "One status per item", body = [BatchUpdateStatus]))
)]
pub async fn batch_update_cards(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(items): Json<Vec<BatchUpdate>>,
) -> Json<Vec<BatchUpdateStatus>> {
    Json(state.batch.update(user.user_id, items).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpdateStatus;
    use crate::storage::secret_path;
    use crate::test_support::TestApp;

    fn create_request() -> CreateCardRequest {
        CreateCardRequest {
            card_holder: "Ada Lovelace".into(),
            pan: TestApp::VISA_CIPHERTEXT.into(),
        }
    }

    #[tokio::test]
    async fn create_card_success() {
        let app = TestApp::new();
        let user = app.user();

        let (status, Json(card)) =
            create_card(Auth(user.clone()), State(app.state.clone()), Json(create_request()))
                .await
                .expect("card creation succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(card.pan, "4111");
        assert_eq!(card.user_id, user.user_id);
        assert!(app
            .secrets
            .get(&secret_path(&user.user_id, &card.id))
            .is_some());
    }

    #[tokio::test]
    async fn create_card_with_invalid_number_is_bad_request() {
        let app = TestApp::new();
        let request = CreateCardRequest {
            card_holder: "Ada Lovelace".into(),
            pan: TestApp::INVALID_CIPHERTEXT.into(),
        };

        let err = create_card(Auth(app.user()), State(app.state.clone()), Json(request))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(app.secrets.len(), 0);
    }

    #[tokio::test]
    async fn get_update_delete_flow() {
        let app = TestApp::new();
        let user = app.user();
        let (_, Json(card)) =
            create_card(Auth(user.clone()), State(app.state.clone()), Json(create_request()))
                .await
                .unwrap();

        let status = update_card(
            Auth(user.clone()),
            Path(card.id),
            State(app.state.clone()),
            Json(UpdateCardRequest {
                card_holder: "Grace Hopper".into(),
            }),
        )
        .await
        .expect("update succeeds");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(fetched) = get_card(Auth(user.clone()), Path(card.id), State(app.state.clone()))
            .await
            .expect("get succeeds");
        assert_eq!(fetched.card_holder, "Grace Hopper");

        let status = delete_card(Auth(user.clone()), Path(card.id), State(app.state.clone()))
            .await
            .expect("delete succeeds");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_card(Auth(user), Path(card.id), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_card_is_not_found() {
        let app = TestApp::new();
        let (_, Json(card)) =
            create_card(Auth(app.user()), State(app.state.clone()), Json(create_request()))
                .await
                .unwrap();
        let stranger = app.stranger();

        let err = get_card(Auth(stranger.clone()), Path(card.id), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = delete_card(Auth(stranger), Path(card.id), State(app.state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn batch_reports_each_item() {
        let app = TestApp::new();
        let user = app.user();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let (_, Json(card)) =
                create_card(Auth(user.clone()), State(app.state.clone()), Json(create_request()))
                    .await
                    .unwrap();
            ids.push(card.id);
        }
        let missing = Uuid::new_v4();

        let Json(statuses) = batch_update_cards(
            Auth(user),
            State(app.state.clone()),
            Json(vec![
                BatchUpdate { id: ids[0], card_holder: "A".into() },
                BatchUpdate { id: missing, card_holder: "B".into() },
                BatchUpdate { id: ids[1], card_holder: "C".into() },
            ]),
        )
        .await;

        assert_eq!(statuses.len(), 3);
        let failed: Vec<_> = statuses
            .iter()
            .filter(|s| s.status == UpdateStatus::Failed)
            .map(|s| s.card)
            .collect();
        assert_eq!(failed, vec![missing]);
    }
}
