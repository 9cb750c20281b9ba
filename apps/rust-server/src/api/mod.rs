// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        BalanceView, CreatePostRequest, CreateVerificationPayloadRequest,
        CreatedPostData, Empty, FeedPage, HealthData, LoginData, LoginRequest, Pagination,
        PostView, RegisterRequest, RegisteredUser, ResendVerificationRequest, SendTokenRequest,
        UnverifiedUser, UserProfile, VerificationResult, VerifiedEmailUser, VerifyPaymentRequest,
        WalletPosts, WalletTransactions,
    },
    state::AppState,
    storage::{DbError, StoredTransaction, TxKind, TxStatus},
    xrpl::LedgerError,
    xumm::{CreatedPayload, PayloadNext, PayloadRefs},
};

pub mod extract;
pub mod health;
pub mod payments;
pub mod posts;
pub mod transactions;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors_allowed_origins);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/verify-email", get(users::verify_email))
        .route("/resend-verification", post(users::resend_verification))
        .route("/profile/{wallet_address}", get(users::get_profile))
        .route(
            "/refresh-balances/{wallet_address}",
            post(users::refresh_balances),
        )
        .route("/verify-payment", post(payments::verify_payment))
        .route(
            "/create-xumm-payload",
            post(payments::create_verification_payload),
        )
        .route("/payload-status/{uuid}", get(payments::payload_status))
        .route(
            "/create-send-token-payload",
            post(payments::create_send_token_payload),
        )
        .route("/post", post(posts::create_post))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{wallet_address}", get(posts::wallet_posts))
        .route(
            "/transactions/{wallet_address}",
            get(transactions::wallet_transactions),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
}

/// CORS for the configured origins; any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Log a storage failure and hide its details from the client.
pub(crate) fn storage_error(context: &str, error: DbError) -> ApiError {
    tracing::error!(error = %error, "{context}");
    ApiError::internal(context.to_string())
}

/// Ledger failures on paths that cannot degrade surface as 503.
pub(crate) fn ledger_unavailable(error: LedgerError) -> ApiError {
    tracing::warn!(error = %error, "XRPL request failed");
    ApiError::service_unavailable("XRPL service is temporarily unavailable")
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::register,
        users::login,
        users::verify_email,
        users::resend_verification,
        users::get_profile,
        users::refresh_balances,
        payments::verify_payment,
        payments::create_verification_payload,
        payments::payload_status,
        payments::create_send_token_payload,
        posts::create_post,
        posts::list_posts,
        posts::wallet_posts,
        transactions::wallet_transactions
    ),
    components(
        schemas(
            Empty,
            RegisterRequest,
            LoginRequest,
            ResendVerificationRequest,
            VerifyPaymentRequest,
            CreateVerificationPayloadRequest,
            SendTokenRequest,
            CreatePostRequest,
            BalanceView,
            RegisteredUser,
            UserProfile,
            LoginData,
            UnverifiedUser,
            VerifiedEmailUser,
            VerificationResult,
            PostView,
            Pagination,
            FeedPage,
            WalletPosts,
            CreatedPostData,
            WalletTransactions,
            StoredTransaction,
            TxKind,
            TxStatus,
            HealthData,
            CreatedPayload,
            PayloadNext,
            PayloadRefs
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service readiness"),
        (name = "Users", description = "Registration, login and profiles"),
        (name = "Verification", description = "Token payment verification via XUMM"),
        (name = "Payments", description = "Token send payloads"),
        (name = "Posts", description = "Token-gated posts and the feed"),
        (name = "Transactions", description = "Per-wallet transaction log")
    )
)]
pub struct ApiDoc;


#[cfg(test)]
mod tests {
    use super::test_util::{get, send};
    use super::*;
    use crate::test_support::test_state;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let harness = test_state();
        let _ = router(harness.state).into_make_service();
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let harness = test_state();
        let app = router(harness.state);

        let (status, body) = send(&app, get("/api-doc/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/register").is_some());
        assert!(body["paths"].get("/api/posts/{wallet_address}").is_some());
        assert!(body["components"]["securitySchemes"].get("bearer").is_some());
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let harness = test_state();
        let app = router(harness.state);

        let response = app.oneshot(get("/api/health")).await.unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn invalid_cors_origins_are_skipped() {
        let _ = cors_layer(&["https://ok.example".to_string(), "bad\norigin".to_string()]);
    }
}
