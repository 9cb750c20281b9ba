// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Per-wallet transaction log.

use axum::{
    extract::{Path, State},
    Json,
};

use super::extract::ApiQuery;
use super::storage_error;
use crate::{
    error::ApiError,
    models::{ApiResponse, TransactionsQuery, WalletTransactions},
    state::AppState,
    xrpl::is_valid_classic_address,
};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 100;

/// Burns and verification payments recorded for a wallet, newest first.
#[utoipa::path(
    get,
    path = "/api/transactions/{wallet_address}",
    tag = "Transactions",
    params(
        ("wallet_address" = String, Path, description = "XRPL classic address"),
        TransactionsQuery
    ),
    responses(
        (status = 200, description = "Transaction log", body = ApiResponse<WalletTransactions>),
        (status = 400, description = "Invalid wallet address"),
    )
)]
pub async fn wallet_transactions(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
    ApiQuery(query): ApiQuery<TransactionsQuery>,
) -> Result<Json<ApiResponse<WalletTransactions>>, ApiError> {
    if !is_valid_classic_address(&wallet_address) {
        return Err(ApiError::bad_request("Invalid XRPL wallet address"));
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let transactions = state
        .transactions()
        .list_by_wallet(&wallet_address, limit)
        .map_err(|e| storage_error("Failed to fetch transactions", e))?;

    Ok(Json(ApiResponse::data(WalletTransactions {
        wallet_address,
        transactions,
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::api::test_util::{get, send};
    use crate::storage::PostBurn;
    use crate::test_support::{seed_verified_user, test_state, ALICE, BOB};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn lists_verification_and_burns() {
        let harness = test_state();
        let user = seed_verified_user(&harness, 5.0);
        for i in 0..3 {
            harness
                .state
                .posts()
                .create_with_burn(
                    user.id,
                    "hello",
                    &PostBurn {
                        tx_hash: format!("BURN{i}"),
                        ledger_index: Some(100 + i),
                        amount: 1.0,
                    },
                )
                .unwrap();
        }
        let app = router(harness.state);

        let (status, body) = send(&app, get(&format!("/api/transactions/{ALICE}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["walletAddress"], ALICE);
        let rows = body["data"]["transactions"].as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().any(|row| row["tx_hash"] == "SEEDVERIFY" && row["type"] == "transfer"));
        assert_eq!(rows.iter().filter(|row| row["type"] == "burn").count(), 3);

        let (_, body) = send(&app, get(&format!("/api/transactions/{ALICE}?limit=2"))).await;
        assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 2);

        let (status, body) = send(&app, get(&format!("/api/transactions/{ALICE}?limit=many"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["transactions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn rejects_invalid_address_and_handles_empty_log() {
        let harness = test_state();
        let app = router(harness.state);

        let (status, body) = send(&app, get("/api/transactions/0xdeadbeef")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid XRPL wallet address");

        let (status, body) = send(&app, get(&format!("/api/transactions/{BOB}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["transactions"].as_array().unwrap().is_empty());
    }
}
