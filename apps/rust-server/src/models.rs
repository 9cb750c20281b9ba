// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for the OpenAPI document.
//!
//! ## Envelope
//!
//! Every response is wrapped in [`ApiResponse`]: `{success, message?, data?}`.
//! Errors use the same shape through [`ApiError`](crate::error::ApiError).
//!
//! ## Field Naming
//!
//! Request bodies are camelCase. User and post views keep the snake_case
//! column names the web client reads (`wallet_address`, `balance_tuldok`),
//! with the few camelCase keys it also expects (`userId`, `hasTrustLine`,
//! `ledgerUrl`).

use chrono::{DateTime, Utc};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::storage::{FeedPost, StoredTransaction, StoredUser};
use crate::xrpl::{explorer_url, AccountBalances};

// =============================================================================
// Envelope
// =============================================================================

/// Placeholder for responses that carry no `data`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Empty {}

/// Standard response envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response with data and no message.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Successful response with message and data.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<Empty> {
    /// Successful response carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

// =============================================================================
// Account Requests
// =============================================================================

/// Body of `POST /api/register`.
///
/// Fields are optional at the serde level so a missing field produces the
/// API's own 400 message instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub wallet_address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub wallet_address: Option<String>,
    /// Accepted for client compatibility; not checked.
    pub signature: Option<String>,
}

/// Body of `POST /api/resend-verification`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendVerificationRequest {
    pub wallet_address: Option<String>,
}

/// Query of `GET /api/verify-email`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct VerifyEmailQuery {
    /// Token from the verification email
    pub token: Option<String>,
}

// =============================================================================
// Verification Requests
// =============================================================================

/// Body of `POST /api/verify-payment`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub token: Option<String>,
    pub tx_hash: Option<String>,
}

/// Body of `POST /api/create-xumm-payload`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVerificationPayloadRequest {
    pub wallet_address: Option<String>,
    pub token: Option<String>,
}

/// Query of `GET /api/payload-status/{uuid}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PayloadStatusQuery {
    /// Verification token of the paying user
    pub token: Option<String>,
}

/// Body of `POST /api/create-send-token-payload`.
///
/// `amount` and `destinationTag` accept either a JSON number or a string.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendTokenRequest {
    pub sender_address: Option<String>,
    pub recipient_address: Option<String>,
    pub recipient_name: Option<String>,
    pub token_type: Option<String>,
    #[schema(value_type = Option<String>, example = "12.5")]
    pub amount: Option<Value>,
    pub memo: Option<String>,
    #[schema(value_type = Option<u32>)]
    pub destination_tag: Option<Value>,
    /// Fee in drops; defaults to 12
    pub fee: Option<String>,
}

// =============================================================================
// Post Requests
// =============================================================================

/// Body of `POST /api/post`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub content: Option<String>,
}

/// Numeric query value; anything unparsable reads as absent.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// Query of `GET /api/posts`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FeedQuery {
    /// 1-based page (default 1)
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u64>,
    /// Page size, 1..=100 (default 20)
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<u64>,
}

/// Query of `GET /api/transactions/{walletAddress}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TransactionsQuery {
    /// Maximum rows, 1..=100 (default 50)
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<usize>,
}

// =============================================================================
// User Views
// =============================================================================

/// Balances returned at registration.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub xrp: f64,
    pub tuldok: f64,
    pub has_trust_line: bool,
}

impl From<AccountBalances> for BalanceView {
    fn from(balances: AccountBalances) -> Self {
        Self {
            xrp: balances.xrp,
            tuldok: balances.tuldok,
            has_trust_line: balances.has_trust_line,
        }
    }
}

/// `data` of a successful registration.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user_id: u64,
    pub wallet_address: String,
    pub email: String,
    pub name: String,
    pub balance: BalanceView,
}

/// Public user profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub wallet_address: String,
    pub email: String,
    pub name: String,
    pub balance_xrp: f64,
    pub balance_tuldok: f64,
    #[serde(rename = "hasTrustLine")]
    pub has_trust_line: bool,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Profile with the given balances in place of the cached ones.
    pub fn with_balances(user: &StoredUser, balances: AccountBalances) -> Self {
        Self {
            user_id: user.id,
            wallet_address: user.wallet_address.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            balance_xrp: balances.xrp,
            balance_tuldok: balances.tuldok,
            has_trust_line: balances.has_trust_line,
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

impl From<&StoredUser> for UserProfile {
    fn from(user: &StoredUser) -> Self {
        Self::with_balances(user, cached_balances(user))
    }
}

/// Balances last written to the user row.
pub fn cached_balances(user: &StoredUser) -> AccountBalances {
    AccountBalances {
        xrp: user.balance_xrp,
        tuldok: user.balance_tuldok,
        has_trust_line: user.has_trust_line,
    }
}

/// `data` of a successful login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginData {
    /// Session token for `Authorization: Bearer`
    pub token: String,
    #[serde(flatten)]
    pub user: UserProfile,
}

/// `data` of a login refused because the account is not verified yet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnverifiedUser {
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub wallet_address: String,
    pub email: String,
    pub name: String,
    pub verified: bool,
}

impl From<&StoredUser> for UnverifiedUser {
    fn from(user: &StoredUser) -> Self {
        Self {
            user_id: user.id,
            wallet_address: user.wallet_address.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            verified: user.verified,
        }
    }
}

/// `data` of `GET /api/verify-email`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifiedEmailUser {
    pub id: u64,
    pub wallet_address: String,
    pub email: String,
    pub name: String,
    pub balance_xrp: f64,
    pub balance_tuldok: f64,
    #[serde(rename = "hasTrustLine")]
    pub has_trust_line: bool,
    pub verified: bool,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Echoed for the payment step; absent once the account is verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl VerifiedEmailUser {
    pub fn new(user: &StoredUser, balances: AccountBalances, token: Option<String>) -> Self {
        Self {
            id: user.id,
            wallet_address: user.wallet_address.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            balance_xrp: balances.xrp,
            balance_tuldok: balances.tuldok,
            has_trust_line: balances.has_trust_line,
            verified: user.verified,
            email_confirmed_at: user.email_confirmed_at,
            created_at: user.created_at,
            token,
        }
    }
}

/// `data` after an account has been verified by payment.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub user_id: u64,
    pub wallet_address: String,
    pub tx_hash: String,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<&StoredUser> for VerificationResult {
    fn from(user: &StoredUser) -> Self {
        Self {
            user_id: user.id,
            wallet_address: user.wallet_address.clone(),
            tx_hash: user.verification_tx_hash.clone().unwrap_or_default(),
            verified_at: user.verified_at,
        }
    }
}

// =============================================================================
// Post Views
// =============================================================================

/// A post joined with its author.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostView {
    pub id: u64,
    pub content: String,
    pub transaction_hash: String,
    pub ledger_index: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
    pub wallet_address: String,
    #[serde(rename = "ledgerUrl")]
    pub ledger_url: String,
}

impl From<FeedPost> for PostView {
    fn from(feed: FeedPost) -> Self {
        let post = feed.post;
        Self {
            ledger_url: explorer_url(&post.transaction_hash),
            id: post.id,
            content: post.content,
            transaction_hash: post.transaction_hash,
            ledger_index: post.ledger_index,
            created_at: post.created_at,
            author_name: feed.author_name,
            wallet_address: post.wallet_address,
        }
    }
}

/// Feed pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_posts: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    /// `limit` must be non-zero.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            current_page: page,
            total_pages,
            total_posts: total,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// `data` of `GET /api/posts`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    pub pagination: Pagination,
}

/// `data` of `GET /api/posts/{walletAddress}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletPosts {
    pub wallet_address: String,
    pub total_posts: usize,
    pub posts: Vec<PostView>,
}

/// `data` of `POST /api/post`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPostData {
    pub post_id: u64,
    pub content: String,
    pub transaction_hash: String,
    pub ledger_index: Option<u64>,
    pub ledger_url: String,
    pub remaining_balance: f64,
}

// =============================================================================
// Transaction Log & Health
// =============================================================================

/// `data` of `GET /api/transactions/{walletAddress}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransactions {
    pub wallet_address: String,
    pub transactions: Vec<StoredTransaction>,
}

/// `data` of `GET /api/health`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthData {
    /// `connected` or `unavailable`
    pub database: String,
    pub ledger_endpoint: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_metadata() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(!p.has_prev_page);

        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let empty = Pagination::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(2, 10, 25)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["totalPosts"], 25);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPrevPage"], true);
    }

    #[test]
    fn envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::message("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "ok" }));

        let json = serde_json::to_value(ApiResponse::data(1)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 1 }));
    }

    #[test]
    fn send_token_request_accepts_numbers_or_strings() {
        let req: SendTokenRequest = serde_json::from_value(serde_json::json!({
            "senderAddress": "rA",
            "recipientAddress": "rB",
            "tokenType": "XRP",
            "amount": 1.5,
            "destinationTag": "7"
        }))
        .unwrap();
        assert_eq!(req.amount, Some(serde_json::json!(1.5)));
        assert_eq!(req.destination_tag, Some(serde_json::json!("7")));
        assert!(req.memo.is_none());
    }
}
