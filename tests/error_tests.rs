// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metro_favorites::error::AppError;
use serde_json::Value;

#[test]
fn test_rejections_are_conflicts() {
    let err = AppError::CapacityExceeded { limit: 15 };
    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert_eq!(err.code(), "capacity_exceeded");
    assert!(err.user_message().contains("15"));

    let err = AppError::Duplicate("p1".to_string());
    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert_eq!(err.code(), "duplicate");

    assert_eq!(AppError::Busy("add").status(), StatusCode::CONFLICT);
}

#[test]
fn test_store_failures_hide_details() {
    let err = AppError::ReadFailure("deadline exceeded at 10.0.0.3".to_string());
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert!(!err.user_message().contains("10.0.0.3"));

    let err = AppError::WriteFailure("permission denied".to_string());
    assert_eq!(err.code(), "write_failure");
    assert!(!err.user_message().contains("permission"));
}

#[test]
fn test_user_errors_keep_their_message() {
    let err = AppError::Validation("stationId is required".to_string());
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert!(err.user_message().contains("stationId"));

    assert_eq!(
        AppError::EmptyCollection.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        AppError::NotFound("Share x".to_string()).status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_response_body_shape() {
    let response = AppError::ReadFailure("boom".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let bytes = axum::body::to_bytes(response.into_body(), 1 << 16)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "read_failure");
    assert_eq!(body["message"], "Could not load data, please try again");
}
