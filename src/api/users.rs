// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::Auth;
use crate::models::UserResponse;

/// Get the current authenticated user's information.
///
/// The `user_id` returned here owns the caller's cards and names their
/// transit key.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserResponse> {
    Json(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CallerIdentity;
    use uuid::Uuid;

    #[tokio::test]
    async fn returns_caller_identity() {
        let user = CallerIdentity {
            user_id: Uuid::new_v4(),
            subject: "kc-ada".to_string(),
            username: Some("ada".to_string()),
            email: None,
        };

        let Json(response) = get_current_user(Auth(user.clone())).await;
        assert_eq!(response.user_id, user.user_id);
        assert_eq!(response.subject, "kc-ada");
        assert_eq!(response.username.as_deref(), Some("ada"));
    }
}
