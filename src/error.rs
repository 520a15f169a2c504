// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::cards::CardError;
use crate::vault::VaultError;

/// Message returned for every dependency failure. The cause is only logged.
const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<CardError> for ApiError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::InvalidPan | CardError::InvalidHolder => Self::bad_request(err.to_string()),
            CardError::Decode(_) => Self::bad_request("malformed card payload"),
            CardError::NotFound => Self::not_found(err.to_string()),
            CardError::Transit(_) | CardError::Secrets(_) | CardError::Store(_) => {
                tracing::error!(error = %err, "Card operation failed");
                Self::internal(INTERNAL_MESSAGE)
            }
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        tracing::error!(error = %err, "Vault request failed");
        Self::internal(INTERNAL_MESSAGE)
    }
}
