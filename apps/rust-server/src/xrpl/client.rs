// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XRPL JSON-RPC client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::types::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on `account_lines` pages followed for one account.
const MAX_LINE_PAGES: usize = 10;

/// Read access to the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// `account_info` against the latest validated ledger.
    async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError>;

    /// All trust lines of `address` (follows pagination markers).
    async fn account_lines(&self, address: &str) -> Result<Vec<TrustLine>, LedgerError>;

    /// Look up a transaction by hash.
    async fn transaction(&self, hash: &str) -> Result<LedgerTransaction, LedgerError>;

    /// Index of the most recent validated ledger.
    async fn validated_ledger_index(&self) -> Result<u64, LedgerError>;

    /// Endpoint description for health output.
    fn endpoint(&self) -> &str;
}

/// HTTPS JSON-RPC implementation of [`LedgerClient`].
pub struct XrplClient {
    rpc_url: String,
    http: Client,
}

impl XrplClient {
    pub fn new(rpc_url: &str) -> Result<Self, LedgerError> {
        let parsed: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rpc_url: parsed.to_string(),
            http,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({ "method": method, "params": [params] });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{method} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{method} returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("{method} invalid JSON: {e}")))?;

        extract_result(payload)
    }
}

#[async_trait]
impl LedgerClient for XrplClient {
    async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError> {
        let result = self
            .call(
                "account_info",
                json!({ "account": address, "ledger_index": "validated" }),
            )
            .await?;
        parse_account_info(&result)
    }

    async fn account_lines(&self, address: &str) -> Result<Vec<TrustLine>, LedgerError> {
        let mut lines = Vec::new();
        let mut marker: Option<Value> = None;

        for _ in 0..MAX_LINE_PAGES {
            let mut params = json!({ "account": address, "ledger_index": "validated" });
            if let Some(m) = marker.take() {
                params["marker"] = m;
            }

            let result = self.call("account_lines", params).await?;
            lines.extend(parse_account_lines(&result)?);

            match result.get("marker") {
                Some(m) if !m.is_null() => marker = Some(m.clone()),
                _ => return Ok(lines),
            }
        }

        tracing::warn!(address, pages = MAX_LINE_PAGES, "account_lines pagination truncated");
        Ok(lines)
    }

    async fn transaction(&self, hash: &str) -> Result<LedgerTransaction, LedgerError> {
        let result = self
            .call("tx", json!({ "transaction": hash, "binary": false }))
            .await?;
        parse_transaction(&result)
    }

    async fn validated_ledger_index(&self) -> Result<u64, LedgerError> {
        let result = self.call("ledger", json!({ "ledger_index": "validated" })).await?;
        result
            .get("ledger_index")
            .and_then(value_as_u64)
            .or_else(|| result.pointer("/ledger/ledger_index").and_then(value_as_u64))
            .ok_or_else(|| LedgerError::InvalidResponse("missing ledger_index".to_string()))
    }

    fn endpoint(&self) -> &str {
        &self.rpc_url
    }
}

// =============================================================================
// Response parsing
// =============================================================================

/// Unwrap `result`, turning `status: error` into a typed error.
fn extract_result(payload: Value) -> Result<Value, LedgerError> {
    let result = payload
        .get("result")
        .cloned()
        .ok_or_else(|| LedgerError::InvalidResponse("missing result".to_string()))?;

    if result.get("status").and_then(Value::as_str) == Some("error") {
        let code = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let message = result
            .get("error_message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        return Err(match code.as_str() {
            "actNotFound" => LedgerError::AccountNotFound,
            "txnNotFound" => LedgerError::TransactionNotFound,
            _ => LedgerError::Rpc { code, message },
        });
    }

    Ok(result)
}

fn value_as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn parse_account_info(result: &Value) -> Result<AccountInfo, LedgerError> {
    let data = result
        .get("account_data")
        .ok_or_else(|| LedgerError::InvalidResponse("missing account_data".to_string()))?;

    let account = data
        .get("Account")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let balance_drops = data
        .get("Balance")
        .and_then(Value::as_str)
        .ok_or_else(|| LedgerError::InvalidResponse("missing Balance".to_string()))?
        .to_string();

    Ok(AccountInfo {
        account,
        balance_drops,
    })
}

fn parse_account_lines(result: &Value) -> Result<Vec<TrustLine>, LedgerError> {
    let lines = result
        .get("lines")
        .cloned()
        .ok_or_else(|| LedgerError::InvalidResponse("missing lines".to_string()))?;
    serde_json::from_value(lines)
        .map_err(|e| LedgerError::InvalidResponse(format!("invalid trust line: {e}")))
}

fn parse_amount(value: Option<&Value>) -> Option<Amount> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Accepts both the flat (API v1) and `tx_json` (API v2) layouts.
fn parse_transaction(result: &Value) -> Result<LedgerTransaction, LedgerError> {
    let tx = result.get("tx_json").unwrap_or(result);
    let meta = result.get("meta");

    let str_field = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

    let transaction_type = str_field(tx, "TransactionType")
        .ok_or_else(|| LedgerError::InvalidResponse("missing TransactionType".to_string()))?;
    let account = str_field(tx, "Account")
        .ok_or_else(|| LedgerError::InvalidResponse("missing Account".to_string()))?;

    let hash = str_field(result, "hash")
        .or_else(|| str_field(tx, "hash"))
        .unwrap_or_default();

    let delivered_amount = meta.and_then(|m| {
        parse_amount(m.get("delivered_amount")).or_else(|| parse_amount(m.get("DeliveredAmount")))
    });

    Ok(LedgerTransaction {
        hash,
        transaction_type,
        account,
        destination: str_field(tx, "Destination"),
        amount: parse_amount(tx.get("Amount").or_else(|| tx.get("DeliverMax"))),
        delivered_amount,
        result: meta.and_then(|m| str_field(m, "TransactionResult")),
        ledger_index: result.get("ledger_index").and_then(value_as_u64),
        validated: result.get("validated").and_then(Value::as_bool).unwrap_or(false),
    })
}

/// Errors from the ledger client.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Ledger transport error: {0}")]
    Transport(String),

    #[error("Ledger RPC error {code}: {message}")]
    Rpc { code: String, message: String },

    #[error("Account not found on ledger")]
    AccountNotFound,

    #[error("Transaction not found on ledger")]
    TransactionNotFound,

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}
