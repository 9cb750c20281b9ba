// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Payload types and builders for the XUMM platform API.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::xrpl::{
    parse_token_value, xrp_to_drops, Amount, AmountError, DEFAULT_FEE_DROPS,
    VERIFICATION_AMOUNT_STR,
};

/// MIME type carried in every memo.
const MEMO_TYPE: &str = "text/plain";

/// Body of `POST /payload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadRequest {
    pub txjson: Value,
    pub custom_meta: CustomMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomMeta {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// Links returned for a created payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct PayloadRefs {
    pub qr_png: String,
    #[serde(default)]
    pub qr_matrix: String,
    #[serde(default)]
    pub websocket_status: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct PayloadNext {
    /// Deep link that opens the payload in the wallet app.
    #[serde(default)]
    pub always: String,
}

/// Response of `POST /payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreatedPayload {
    pub uuid: String,
    #[serde(default)]
    pub next: PayloadNext,
    pub refs: PayloadRefs,
}

/// Current state of a payload as reported by `GET /payload/{uuid}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayloadStatus {
    pub resolved: bool,
    pub signed: bool,
    pub cancelled: bool,
    pub expired: bool,
    pub txid: Option<String>,
    pub dispatched_result: Option<String>,
    pub account: Option<String>,
}

/// Build the 33 TULDOK verification payment from `wallet` to the issuer.
pub fn verification_payload(user_id: u64, wallet_address: &str, issuer: &str) -> PayloadRequest {
    PayloadRequest {
        txjson: json!({
            "TransactionType": "Payment",
            "Account": wallet_address,
            "Destination": issuer,
            "Amount": Amount::tuldok(VERIFICATION_AMOUNT_STR, issuer),
        }),
        custom_meta: CustomMeta {
            identifier: format!("user_verification_{user_id}"),
            blob: Some(json!({ "userId": user_id })),
            instruction: Some("Pay 33 TULDOK to verify your TULDOK Social account".to_string()),
        },
    }
}

/// Asset being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TokenType {
    #[serde(rename = "XRP")]
    Xrp,
    #[serde(rename = "TULDOK")]
    Tuldok,
}

impl std::str::FromStr for TokenType {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "XRP" => Ok(TokenType::Xrp),
            "TULDOK" => Ok(TokenType::Tuldok),
            other => Err(PayloadError::UnsupportedToken(other.to_string())),
        }
    }
}

/// Validated input for [`send_token_payload`].
#[derive(Debug, Clone)]
pub struct SendTokenParams<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    pub recipient_name: Option<&'a str>,
    pub token_type: TokenType,
    pub amount: &'a str,
    pub memo: Option<&'a str>,
    pub destination_tag: Option<u32>,
    pub fee: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("Invalid token type: {0}. Supported: XRP, TULDOK")]
    UnsupportedToken(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid fee: {0}")]
    InvalidFee(String),
}

/// Hex-encode a memo field the way the ledger expects (uppercase).
fn memo_hex(text: &str) -> String {
    hex::encode_upper(text.as_bytes())
}

/// Build a Payment payload for sending XRP or TULDOK.
pub fn send_token_payload(
    params: &SendTokenParams<'_>,
    issuer: &str,
) -> Result<PayloadRequest, PayloadError> {
    let amount = match params.token_type {
        TokenType::Xrp => Amount::Drops(xrp_to_drops(params.amount)?.to_string()),
        TokenType::Tuldok => Amount::tuldok(parse_token_value(params.amount)?, issuer),
    };

    let fee = match params.fee.map(str::trim).filter(|f| !f.is_empty()) {
        Some(fee) if fee.bytes().all(|b| b.is_ascii_digit()) => fee.to_string(),
        Some(fee) => return Err(PayloadError::InvalidFee(fee.to_string())),
        None => DEFAULT_FEE_DROPS.to_string(),
    };

    let mut txjson = json!({
        "TransactionType": "Payment",
        "Account": params.sender,
        "Destination": params.recipient,
        "Amount": amount,
        "Fee": fee,
    });

    if let Some(memo) = params.memo.filter(|m| !m.is_empty()) {
        txjson["Memos"] = json!([{
            "Memo": {
                "MemoData": memo_hex(memo),
                "MemoType": memo_hex(MEMO_TYPE),
            }
        }]);
    }

    if let Some(tag) = params.destination_tag {
        txjson["DestinationTag"] = json!(tag);
    }

    let now = Utc::now();
    Ok(PayloadRequest {
        txjson,
        custom_meta: CustomMeta {
            identifier: format!("send_token_{}", now.timestamp_millis()),
            blob: Some(json!({
                "senderAddress": params.sender,
                "recipientAddress": params.recipient,
                "recipientName": params.recipient_name,
                "tokenType": params.token_type,
                "amount": params.amount,
                "memo": params.memo,
                "destinationTag": params.destination_tag,
                "timestamp": now.to_rfc3339(),
            })),
            instruction: None,
        },
    })
}
