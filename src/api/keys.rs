// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{auth::Auth, error::ApiError, models::KeyResponse, state::AppState};

/// Provision the caller's transit key.
///
/// Clients encrypt card numbers with the returned public key before
/// submitting them.
#[utoipa::path(
    post,
    path = "/v1/keys",
    tag = "Keys",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Key created", body = KeyResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Transit engine failure")
    )
)]
pub async fn create_key(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<KeyResponse>), ApiError> {
    let public_key = state.keys.create_key(&user.user_id).await?;
    Ok((StatusCode::CREATED, Json(KeyResponse { public_key })))
}
