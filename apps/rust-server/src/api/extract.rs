// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Request extractors whose rejections render the `{success, message}`
//! envelope instead of axum's plain-text bodies.

use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    FromRequest, FromRequestParts,
};
use tracing::debug;

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "Rejected request body");
        ApiError::new(rejection.status(), "Invalid request body.")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!(reason = %rejection.body_text(), "Rejected query string");
        ApiError::new(rejection.status(), "Invalid query parameters.")
    }
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::api::test_util::send;
    use crate::test_support::test_state;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };

    fn raw_post(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn malformed_body_uses_envelope() {
        let harness = test_state();
        let app = router(harness.state);

        let (status, body) = send(
            &app,
            raw_post("/api/register", Some("application/json"), "{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid request body.");

        let (status, body) = send(&app, raw_post("/api/login", None, "{}")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            raw_post("/api/verify-payment", Some("application/json"), r#"{"token": 5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Invalid request body.");
    }
}
