// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure is reported as short, user-visible status text; none of
//! them is fatal to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    /// Missing context or a structurally invalid payload.
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("This station already has {limit} favorites")]
    CapacityExceeded { limit: usize },

    /// Informational: the venue is already saved in this scope.
    #[error("Already in favorites: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("There are no favorites to share")]
    EmptyCollection,

    #[error("Read failed: {0}")]
    ReadFailure(String),

    #[error("Write failed: {0}")]
    WriteFailure(String),

    /// Another operation of the same kind is still running for this user.
    #[error("A {0} request is already in progress")]
    Busy(&'static str),

    #[error("Places API error: {0}")]
    PlacesApi(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidToken => "invalid_token",
            AppError::Validation(_) => "validation_failure",
            AppError::CapacityExceeded { .. } => "capacity_exceeded",
            AppError::Duplicate(_) => "duplicate",
            AppError::NotFound(_) => "not_found",
            AppError::EmptyCollection => "empty_collection",
            AppError::ReadFailure(_) => "read_failure",
            AppError::WriteFailure(_) => "write_failure",
            AppError::Busy(_) => "busy",
            AppError::PlacesApi(_) => "places_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for the error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::CapacityExceeded { .. } | AppError::Duplicate(_) | AppError::Busy(_) => {
                StatusCode::CONFLICT
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmptyCollection => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ReadFailure(_) | AppError::WriteFailure(_) | AppError::PlacesApi(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show to the user. Backend details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ReadFailure(_) => "Could not load data, please try again".to_string(),
            AppError::WriteFailure(_) => "Could not save changes, please try again".to_string(),
            AppError::PlacesApi(_) => "Could not look up this place right now".to_string(),
            AppError::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ReadFailure(msg) | AppError::WriteFailure(msg) => {
                tracing::error!(error = %msg, code = self.code(), "Store error");
            }
            AppError::PlacesApi(msg) => {
                tracing::warn!(error = %msg, "Places API error");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
            AppError::Duplicate(place_id) => {
                tracing::info!(place_id = %place_id, "Duplicate favorite rejected");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: self.code(),
            message: self.user_message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
