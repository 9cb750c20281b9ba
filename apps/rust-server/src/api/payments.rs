// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! # Payment Endpoints
//!
//! Account verification by a 33 TULDOK payment to the issuer, and wallet
//! payloads for sending XRP or TULDOK.
//!
//! ## Verification Paths
//!
//! 1. `POST /api/verify-payment`: the client submits the hash of a payment it
//!    made; the transaction is looked up on the ledger and checked.
//! 2. `POST /api/create-xumm-payload` then `GET /api/payload-status/{uuid}`:
//!    the server creates a wallet payload and waits for the user to sign it,
//!    then checks the signed transaction on the ledger like path 1.
//!
//! Both paths end in [`UserRepository::mark_verified`], which refuses a
//! second verification of the same user.
//!
//! Funds never move server-side: send-token requests only produce payloads
//! the user approves in the wallet app.
//!
//! [`UserRepository::mark_verified`]: crate::storage::UserRepository::mark_verified

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::{debug, error, info};

use super::extract::{ApiJson, ApiQuery};
use super::{ledger_unavailable, storage_error};
use crate::{
    error::ApiError,
    models::{
        ApiResponse, CreateVerificationPayloadRequest, PayloadStatusQuery, SendTokenRequest,
        VerificationResult, VerifyPaymentRequest,
    },
    state::AppState,
    storage::{DbError, StoredUser},
    validation::required,
    xrpl::{
        check_verification_payment, is_valid_classic_address, Amount, LedgerError,
        LedgerTransaction, PaymentMismatch, VERIFICATION_AMOUNT,
    },
    xumm::{
        send_token_payload, verification_payload, CreatedPayload, PayloadOutcome, PayloadWatcher,
        SendTokenParams, SigningError, TokenType,
    },
};

const PAYMENT_MISMATCH: &str = "Payment does not match required details.";
const NOT_APPROVED: &str = "Payment was not approved.";
const ALREADY_VERIFIED: &str = "User is already verified.";
const CONFIG_ERROR: &str = "Server configuration error.";
const TX_NOT_SUCCESSFUL: &str = "Transaction not found or not successful.";

/// Ledger lookups made for a signed payload before giving up on validation.
const LEDGER_SETTLE_ATTEMPTS: u32 = 10;

fn signing_failure(error: SigningError, context: &'static str) -> ApiError {
    match error {
        SigningError::NotConfigured => {
            ApiError::service_unavailable("Payment signing service is not configured.")
        }
        other => {
            error!(error = %other, "{context}");
            ApiError::internal(context)
        }
    }
}

/// Record the verification, treating a concurrent verification as a conflict.
fn complete_verification(
    state: &AppState,
    user: &StoredUser,
    tx_hash: &str,
    amount: f64,
    ledger_index: Option<u64>,
) -> Result<StoredUser, ApiError> {
    let verified = state
        .users()
        .mark_verified(user.id, tx_hash, amount, ledger_index)
        .map_err(|e| match e {
            DbError::Conflict(_) => ApiError::conflict(ALREADY_VERIFIED),
            other => storage_error("Failed to record verification", other),
        })?;

    info!(user_id = verified.id, tx_hash, "User verified by payment");
    Ok(verified)
}

/// TULDOK actually delivered by a verification payment.
fn paid_amount(tx: &LedgerTransaction) -> f64 {
    match tx.effective_amount() {
        Some(Amount::Issued { value, .. }) => value.parse().unwrap_or(VERIFICATION_AMOUNT),
        _ => VERIFICATION_AMOUNT,
    }
}

/// Reject `tx` unless it is this user's validated verification payment.
fn qualifying_payment(
    state: &AppState,
    user: &StoredUser,
    tx: &LedgerTransaction,
) -> Result<(), ApiError> {
    check_verification_payment(tx, &user.wallet_address, &state.settings.issuer_address).map_err(
        |mismatch| {
            info!(
                user_id = user.id,
                tx_hash = %tx.hash,
                reason = %mismatch,
                "Verification payment rejected"
            );
            match mismatch {
                PaymentMismatch::NotPayment
                | PaymentMismatch::NotValidated
                | PaymentMismatch::Failed(_) => ApiError::bad_request(TX_NOT_SUCCESSFUL),
                _ => ApiError::bad_request(PAYMENT_MISMATCH),
            }
        },
    )
}

/// Fetch a freshly signed transaction, waiting for it to reach a validated
/// ledger.
///
/// Retries at the payload poll interval while the transaction is unknown or
/// provisional; the last lookup is returned as is.
async fn settled_transaction(
    state: &AppState,
    txid: &str,
) -> Result<LedgerTransaction, ApiError> {
    let mut attempt = 1;
    loop {
        let pending = match state.ledger.transaction(txid).await {
            Ok(tx) if tx.validated => return Ok(tx),
            Ok(tx) => Ok(tx),
            Err(LedgerError::TransactionNotFound) => {
                Err(ApiError::bad_request(TX_NOT_SUCCESSFUL))
            }
            Err(other) => return Err(ledger_unavailable(other)),
        };

        if attempt >= LEDGER_SETTLE_ATTEMPTS {
            return pending;
        }
        attempt += 1;

        debug!(txid, attempt, "Waiting for signed transaction to validate");
        tokio::select! {
            _ = tokio::time::sleep(state.settings.payload_poll_interval) => {},
            _ = state.shutdown.cancelled() => return pending,
        }
    }
}

/// Verify an account from the hash of a payment already on the ledger.
#[utoipa::path(
    post,
    path = "/api/verify-payment",
    tag = "Verification",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Account verified", body = ApiResponse<VerificationResult>),
        (status = 400, description = "Missing fields, already verified or payment rejected"),
        (status = 404, description = "Unknown verification token"),
        (status = 503, description = "Ledger unavailable"),
    )
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<VerificationResult>>, ApiError> {
    let (Some(token), Some(tx_hash)) = (required(&request.token), required(&request.tx_hash))
    else {
        return Err(ApiError::bad_request(
            "Token and transaction hash are required.",
        ));
    };

    let user = state
        .users()
        .find_by_verification_token(token)
        .map_err(|e| storage_error("Internal server error during payment verification.", e))?
        .ok_or_else(|| ApiError::not_found("Invalid verification token."))?;

    if user.verified {
        return Err(ApiError::bad_request(ALREADY_VERIFIED));
    }

    let tx = state.ledger.transaction(tx_hash).await.map_err(|e| match e {
        LedgerError::TransactionNotFound => ApiError::bad_request(TX_NOT_SUCCESSFUL),
        other => ledger_unavailable(other),
    })?;

    qualifying_payment(&state, &user, &tx)?;

    let verified = complete_verification(&state, &user, &tx.hash, paid_amount(&tx), tx.ledger_index)?;

    Ok(Json(ApiResponse::with_message(
        "Payment verified and user marked as verified.",
        VerificationResult::from(&verified),
    )))
}

/// Create the 33 TULDOK verification payload for the wallet app.
#[utoipa::path(
    post,
    path = "/api/create-xumm-payload",
    tag = "Verification",
    request_body = CreateVerificationPayloadRequest,
    responses(
        (status = 200, description = "Payload created", body = ApiResponse<CreatedPayload>),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "Unknown token or user already verified"),
        (status = 500, description = "Issuer not configured"),
        (status = 503, description = "Signing service not configured"),
    )
)]
pub async fn create_verification_payload(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateVerificationPayloadRequest>,
) -> Result<Json<ApiResponse<CreatedPayload>>, ApiError> {
    let (Some(wallet_address), Some(token)) =
        (required(&request.wallet_address), required(&request.token))
    else {
        return Err(ApiError::bad_request(
            "Wallet address and token are required.",
        ));
    };

    let issuer = &state.settings.issuer_address;
    if !is_valid_classic_address(issuer) {
        error!(issuer = %issuer, "Issuer address is not a valid XRPL address");
        return Err(ApiError::internal(CONFIG_ERROR));
    }

    let user = state
        .users()
        .find_by_verification_token(token)
        .map_err(|e| storage_error("Failed to create payment request.", e))?
        .filter(|user| !user.verified && user.wallet_address == wallet_address)
        .ok_or_else(|| ApiError::not_found("Invalid verification token or user already verified."))?;

    let payload = verification_payload(user.id, &user.wallet_address, issuer);
    let created = state
        .signing
        .create_payload(&payload)
        .await
        .map_err(|e| signing_failure(e, "Failed to create payment request."))?;

    info!(user_id = user.id, uuid = %created.uuid, "Verification payload created");
    Ok(Json(ApiResponse::data(created)))
}

/// Wait for the verification payload to be resolved and apply the result.
///
/// Holds the request open while polling the signing service, up to the
/// configured timeout.
#[utoipa::path(
    get,
    path = "/api/payload-status/{uuid}",
    tag = "Verification",
    params(
        ("uuid" = String, Path, description = "Payload UUID"),
        PayloadStatusQuery
    ),
    responses(
        (status = 200, description = "Payment signed; account verified", body = ApiResponse<VerificationResult>),
        (status = 400, description = "Payment not approved or does not match"),
        (status = 404, description = "Unknown payload"),
    )
)]
pub async fn payload_status(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    ApiQuery(query): ApiQuery<PayloadStatusQuery>,
) -> Result<Json<ApiResponse<VerificationResult>>, ApiError> {
    let token = required(&query.token)
        .ok_or_else(|| ApiError::bad_request("Verification token is required."))?;

    let user = state
        .users()
        .find_by_verification_token(token)
        .map_err(|e| storage_error("Error checking payment status.", e))?
        .filter(|user| !user.verified)
        .ok_or_else(|| ApiError::bad_request("Invalid or expired verification token."))?;

    let outcome = PayloadWatcher::new(state.signing.as_ref(), state.settings.payload_timeout)
        .with_poll_interval(state.settings.payload_poll_interval)
        .wait(&uuid, &state.shutdown)
        .await
        .map_err(|e| match e {
            SigningError::NotFound(_) => ApiError::not_found("Payment session not found or expired."),
            other => signing_failure(other, "Error checking payment status."),
        })?;

    match outcome {
        PayloadOutcome::Signed { txid, account } if !txid.is_empty() => {
            if account.as_deref().is_some_and(|a| a != user.wallet_address) {
                info!(user_id = user.id, uuid = %uuid, "Payload signed by another account");
                return Err(ApiError::bad_request(PAYMENT_MISMATCH));
            }
            let tx = settled_transaction(&state, &txid).await?;
            qualifying_payment(&state, &user, &tx)?;
            let verified =
                complete_verification(&state, &user, &tx.hash, paid_amount(&tx), tx.ledger_index)?;
            Ok(Json(ApiResponse::with_message(
                "Payment verified and account activated!",
                VerificationResult::from(&verified),
            )))
        }
        PayloadOutcome::Failed { txid, result } => {
            info!(user_id = user.id, txid = %txid, result = %result, "Verification payment failed");
            Err(ApiError::bad_request(NOT_APPROVED))
        }
        other => {
            info!(user_id = user.id, uuid = %uuid, outcome = ?other, "Verification payload not approved");
            Err(ApiError::bad_request(NOT_APPROVED))
        }
    }
}

/// String form of a JSON number or non-empty string.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn destination_tag(value: Option<&Value>) -> Result<Option<u32>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid destination tag");
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value_text(value)
            .and_then(|text| text.parse::<u32>().ok())
            .map(Some)
            .ok_or_else(invalid),
    }
}

/// Build a wallet payload that sends XRP or TULDOK.
#[utoipa::path(
    post,
    path = "/api/create-send-token-payload",
    tag = "Payments",
    request_body = SendTokenRequest,
    responses(
        (status = 200, description = "Payload created", body = ApiResponse<CreatedPayload>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 503, description = "Signing service not configured"),
    )
)]
pub async fn create_send_token_payload(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendTokenRequest>,
) -> Result<Json<ApiResponse<CreatedPayload>>, ApiError> {
    let (Some(sender), Some(recipient), Some(token_type), Some(amount)) = (
        required(&request.sender_address),
        required(&request.recipient_address),
        required(&request.token_type),
        request.amount.as_ref().and_then(value_text),
    ) else {
        return Err(ApiError::bad_request(
            "Missing required fields: senderAddress, recipientAddress, tokenType, amount",
        ));
    };

    if !is_valid_classic_address(sender) {
        return Err(ApiError::bad_request("Invalid sender address"));
    }
    if !is_valid_classic_address(recipient) {
        return Err(ApiError::bad_request("Invalid recipient address"));
    }

    let token_type: TokenType = token_type
        .parse()
        .map_err(|e: crate::xumm::PayloadError| ApiError::bad_request(e.to_string()))?;

    let issuer = &state.settings.issuer_address;
    if token_type == TokenType::Tuldok && !is_valid_classic_address(issuer) {
        error!(issuer = %issuer, "Issuer address is not a valid XRPL address");
        return Err(ApiError::internal(CONFIG_ERROR));
    }

    let params = SendTokenParams {
        sender,
        recipient,
        recipient_name: required(&request.recipient_name),
        token_type,
        amount: &amount,
        memo: required(&request.memo),
        destination_tag: destination_tag(request.destination_tag.as_ref())?,
        fee: request.fee.as_deref(),
    };

    let payload =
        send_token_payload(&params, issuer).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let created = state
        .signing
        .create_payload(&payload)
        .await
        .map_err(|e| signing_failure(e, "Failed to create payment request."))?;

    info!(
        sender,
        recipient,
        token_type = ?token_type,
        amount = %amount,
        uuid = %created.uuid,
        "Send-token payload created"
    );
    Ok(Json(ApiResponse::data(created)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::api::test_util::{get, post_json, send};
    use crate::config::DEFAULT_ISSUER_ADDRESS;
    use crate::storage::{TxKind, TxStatus};
    use crate::test_support::{seed_user, test_state, FakeSigning, TestHarness, ALICE, BOB};
    use crate::xumm::PayloadStatus;
    use axum::http::StatusCode;
    use serde_json::json;

    fn token() -> String {
        "a".repeat(64)
    }

    fn seeded() -> TestHarness {
        let harness = test_state();
        seed_user(&harness, ALICE, "juan@example.com", &token());
        harness
    }

    fn tuldok_payment(hash: &str, from: &str, value: &str) -> LedgerTransaction {
        LedgerTransaction {
            hash: hash.to_string(),
            transaction_type: "Payment".to_string(),
            account: from.to_string(),
            destination: Some(DEFAULT_ISSUER_ADDRESS.to_string()),
            amount: Some(Amount::tuldok(value, DEFAULT_ISSUER_ADDRESS)),
            delivered_amount: None,
            result: Some("tesSUCCESS".to_string()),
            ledger_index: Some(88_000_000),
            validated: true,
        }
    }

    fn verify_body(tx_hash: &str) -> Value {
        json!({ "token": token(), "txHash": tx_hash })
    }

    #[tokio::test]
    async fn verify_payment_marks_user_verified() {
        let harness = seeded();
        harness.ledger.add_transaction(tuldok_payment("HASH1", ALICE, "33"));
        let app = router(harness.state.clone());

        let (status, body) = send(&app, post_json("/api/verify-payment", verify_body("HASH1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Payment verified and user marked as verified.");
        assert_eq!(body["data"]["walletAddress"], ALICE);
        assert_eq!(body["data"]["txHash"], "HASH1");

        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        assert!(user.verified);
        assert!(user.verified_at.is_some());

        let log = harness.state.transactions().list_by_wallet(ALICE, 10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, TxKind::Transfer);
        assert_eq!(log[0].status, TxStatus::Confirmed);
        assert_eq!(log[0].ledger_index, Some(88_000_000));

        let (status, body) = send(&app, post_json("/api/verify-payment", verify_body("HASH1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User is already verified.");
    }

    #[tokio::test]
    async fn verify_payment_rejects_bad_requests() {
        let harness = seeded();
        harness.ledger.add_transaction(tuldok_payment("SHORT", ALICE, "10"));
        harness.ledger.add_transaction(tuldok_payment("OTHER", BOB, "33"));
        let mut failed = tuldok_payment("FAILED", ALICE, "33");
        failed.result = Some("tecPATH_DRY".to_string());
        harness.ledger.add_transaction(failed);
        let mut provisional = tuldok_payment("PROVISIONAL", ALICE, "33");
        provisional.validated = false;
        harness.ledger.add_transaction(provisional);
        let app = router(harness.state.clone());

        let (status, _) = send(&app, post_json("/api/verify-payment", json!({ "token": token() }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            post_json("/api/verify-payment", json!({ "token": "nope", "txHash": "SHORT" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Invalid verification token.");

        for (hash, message) in [
            ("MISSING", "Transaction not found or not successful."),
            ("FAILED", "Transaction not found or not successful."),
            ("PROVISIONAL", "Transaction not found or not successful."),
            ("SHORT", PAYMENT_MISMATCH),
            ("OTHER", PAYMENT_MISMATCH),
        ] {
            let (status, body) = send(&app, post_json("/api/verify-payment", verify_body(hash))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{hash}");
            assert_eq!(body["message"], message, "{hash}");
        }

        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        assert!(!user.verified);
    }

    #[tokio::test]
    async fn verify_payment_reports_ledger_outage() {
        let harness = seeded();
        harness.ledger.set_offline(true);
        let app = router(harness.state);

        let (status, _) = send(&app, post_json("/api/verify-payment", verify_body("HASH1"))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn create_verification_payload_for_pending_user() {
        let harness = seeded();
        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        let app = router(harness.state.clone());

        let request = json!({ "walletAddress": ALICE, "token": token() });
        let (status, body) = send(&app, post_json("/api/create-xumm-payload", request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["uuid"], "payload-1");
        assert!(body["data"]["refs"]["qr_png"].as_str().unwrap().ends_with("_q.png"));

        let created = harness.signing.created();
        assert_eq!(created.len(), 1);
        assert_eq!(
            created[0].custom_meta.identifier,
            format!("user_verification_{}", user.id)
        );
        assert_eq!(created[0].txjson["Account"], ALICE);
        assert_eq!(created[0].txjson["Destination"], DEFAULT_ISSUER_ADDRESS);
        assert_eq!(created[0].txjson["Amount"]["value"], "33");
    }

    #[tokio::test]
    async fn create_verification_payload_rejects_unknown_token() {
        let harness = seeded();
        let app = router(harness.state.clone());

        let (status, _) = send(&app, post_json("/api/create-xumm-payload", json!({ "walletAddress": ALICE }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = json!({ "walletAddress": ALICE, "token": "unknown" });
        let (status, _) = send(&app, post_json("/api/create-xumm-payload", request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = json!({ "walletAddress": BOB, "token": token() });
        let (status, _) = send(&app, post_json("/api/create-xumm-payload", request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(harness.signing.created().is_empty());
    }

    fn status_uri(uuid: &str) -> String {
        format!("/api/payload-status/{uuid}?token={}", token())
    }

    #[tokio::test]
    async fn signed_payload_verifies_user() {
        let harness = seeded();
        harness.ledger.add_transaction(tuldok_payment("TXID1", ALICE, "33"));
        let mut signed = FakeSigning::signed("TXID1");
        signed.account = Some(ALICE.to_string());
        harness
            .signing
            .script("p1", vec![PayloadStatus::default(), PayloadStatus::default(), signed]);
        let app = router(harness.state.clone());

        let (status, body) = send(&app, get(&status_uri("p1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Payment verified and account activated!");
        assert_eq!(body["data"]["txHash"], "TXID1");
        assert_eq!(harness.signing.status_calls("p1"), 3);

        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        assert!(user.verified);
        assert_eq!(user.verification_tx_hash.as_deref(), Some("TXID1"));
        let logged = harness.state.transactions().get("TXID1").unwrap().unwrap();
        assert_eq!(logged.status, TxStatus::Confirmed);
        assert_eq!(logged.ledger_index, Some(88_000_000));

        // The token no longer identifies a pending user.
        let (status, _) = send(&app, get(&status_uri("p1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_send_payload_does_not_verify_user() {
        let harness = seeded();
        let app = router(harness.state.clone());

        let request = json!({
            "senderAddress": ALICE,
            "recipientAddress": BOB,
            "tokenType": "XRP",
            "amount": "0.000001",
        });
        let (status, body) = send(&app, post_json("/api/create-send-token-payload", request)).await;
        assert_eq!(status, StatusCode::OK);
        let uuid = body["data"]["uuid"].as_str().unwrap().to_string();

        let mut tiny = tuldok_payment("TINYXRP", ALICE, "33");
        tiny.destination = Some(BOB.to_string());
        tiny.amount = Some(Amount::Drops("1".to_string()));
        harness.ledger.add_transaction(tiny);
        let mut signed = FakeSigning::signed("TINYXRP");
        signed.account = Some(ALICE.to_string());
        harness.signing.script(&uuid, vec![signed]);

        let (status, body) = send(&app, get(&status_uri(&uuid))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], PAYMENT_MISMATCH);

        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        assert!(!user.verified);
        assert!(harness.state.transactions().get("TINYXRP").unwrap().is_none());
    }

    #[tokio::test]
    async fn signed_payload_must_reach_validated_ledger() {
        let harness = seeded();
        let mut provisional = tuldok_payment("OPEN1", ALICE, "33");
        provisional.validated = false;
        harness.ledger.add_transaction(provisional);
        let mut signed = FakeSigning::signed("OPEN1");
        signed.account = Some(ALICE.to_string());
        harness.signing.script("open", vec![signed]);
        let mut unknown = FakeSigning::signed("NOWHERE");
        unknown.account = Some(ALICE.to_string());
        harness.signing.script("unknown", vec![unknown]);
        let app = router(harness.state.clone());

        for uuid in ["open", "unknown"] {
            let (status, body) = send(&app, get(&status_uri(uuid))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uuid}");
            assert_eq!(body["message"], TX_NOT_SUCCESSFUL, "{uuid}");
        }

        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        assert!(!user.verified);

        harness.ledger.add_transaction(tuldok_payment("OPEN1", ALICE, "33"));
        let (status, _) = send(&app, get(&status_uri("open"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unapproved_payloads_are_rejected() {
        let harness = seeded();
        let rejected = PayloadStatus {
            resolved: true,
            ..PayloadStatus::default()
        };
        let expired = PayloadStatus {
            expired: true,
            ..PayloadStatus::default()
        };
        let mut foreign = FakeSigning::signed("TXID2");
        foreign.account = Some(BOB.to_string());
        harness.signing.script("rejected", vec![rejected]);
        harness.signing.script("expired", vec![expired]);
        harness.signing.script("pending", vec![PayloadStatus::default()]);
        harness.signing.script("foreign", vec![foreign]);
        let app = router(harness.state.clone());

        for uuid in ["rejected", "expired", "pending"] {
            let (status, body) = send(&app, get(&status_uri(uuid))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uuid}");
            assert_eq!(body["message"], NOT_APPROVED, "{uuid}");
        }

        let (status, body) = send(&app, get(&status_uri("foreign"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], PAYMENT_MISMATCH);

        let (status, body) = send(&app, get(&status_uri("missing"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Payment session not found or expired.");

        let (status, body) = send(&app, get("/api/payload-status/rejected")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Verification token is required.");

        let user = harness.state.users().find_by_wallet(ALICE).unwrap().unwrap();
        assert!(!user.verified);
    }

    #[tokio::test]
    async fn send_token_payload_for_xrp() {
        let harness = test_state();
        let app = router(harness.state.clone());

        let request = json!({
            "senderAddress": ALICE,
            "recipientAddress": BOB,
            "recipientName": "Bob",
            "tokenType": "XRP",
            "amount": 1.5,
            "memo": "hi",
            "destinationTag": "42"
        });
        let (status, body) = send(&app, post_json("/api/create-send-token-payload", request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["uuid"], "payload-1");

        let created = harness.signing.created();
        let txjson = &created[0].txjson;
        assert_eq!(txjson["Amount"], "1500000");
        assert_eq!(txjson["Fee"], "12");
        assert_eq!(txjson["DestinationTag"], 42);
        assert_eq!(txjson["Memos"][0]["Memo"]["MemoData"], "6869");
    }

    #[tokio::test]
    async fn send_token_payload_for_tuldok() {
        let harness = test_state();
        let app = router(harness.state.clone());

        let request = json!({
            "senderAddress": ALICE,
            "recipientAddress": BOB,
            "tokenType": "TULDOK",
            "amount": "5"
        });
        let (status, _) = send(&app, post_json("/api/create-send-token-payload", request)).await;
        assert_eq!(status, StatusCode::OK);

        let created = harness.signing.created();
        assert_eq!(created[0].txjson["Amount"]["value"], "5");
        assert_eq!(created[0].txjson["Amount"]["issuer"], DEFAULT_ISSUER_ADDRESS);
        assert!(created[0].txjson.get("DestinationTag").is_none());
    }

    #[tokio::test]
    async fn send_token_payload_validation() {
        let harness = test_state();
        let app = router(harness.state.clone());

        let base = json!({
            "senderAddress": ALICE,
            "recipientAddress": BOB,
            "tokenType": "XRP",
            "amount": "1"
        });

        let cases = [
            ("amount", Value::Null),
            ("recipientAddress", json!("rNotAnAddress")),
            ("senderAddress", json!("bad")),
            ("tokenType", json!("BTC")),
            ("amount", json!("-3")),
            ("amount", json!(0)),
            ("destinationTag", json!("tag")),
            ("fee", json!("1.5")),
        ];

        for (field, value) in cases {
            let mut request = base.clone();
            request[field] = value;
            let (status, body) = send(&app, post_json("/api/create-send-token-payload", request)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{field}: {body}");
        }
        assert!(harness.signing.created().is_empty());
    }

    #[test]
    fn destination_tag_parsing() {
        assert_eq!(destination_tag(None).unwrap(), None);
        assert_eq!(destination_tag(Some(&json!(""))).unwrap(), None);
        assert_eq!(destination_tag(Some(&json!(7))).unwrap(), Some(7));
        assert_eq!(destination_tag(Some(&json!("4294967295"))).unwrap(), Some(u32::MAX));
        assert!(destination_tag(Some(&json!(-1))).is_err());
        assert!(destination_tag(Some(&json!("4294967296"))).is_err());
    }
}
