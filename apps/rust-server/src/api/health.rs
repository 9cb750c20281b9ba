// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::models::{ApiResponse, HealthData};
use crate::state::AppState;

/// Readiness probe.
///
/// Returns 200 when the database answers, 503 otherwise. The ledger is not
/// contacted; its endpoint is reported for reference.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ApiResponse<HealthData>),
        (status = 503, description = "Database unavailable", body = ApiResponse<HealthData>)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let db_result = state.db.health_check();

    let data = HealthData {
        database: if db_result.is_ok() { "connected" } else { "unavailable" }.to_string(),
        ledger_endpoint: state.ledger.endpoint().to_string(),
        timestamp: Utc::now(),
    };

    match db_result {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::with_message("TULDOK Social Backend is healthy!", data)),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            let mut body = ApiResponse::with_message("Service unhealthy", data);
            body.success = false;
            (StatusCode::SERVICE_UNAVAILABLE, Json(body))
        }
    }
}
