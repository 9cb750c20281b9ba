// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Token-gated posts and the public feed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use super::extract::{ApiJson, ApiQuery};
use super::storage_error;
use crate::{
    auth::Auth,
    error::ApiError,
    models::{
        ApiResponse, CreatePostRequest, CreatedPostData, FeedPage, FeedQuery, Pagination,
        PostView, WalletPosts,
    },
    state::AppState,
    storage::{DbError, PostBurn},
    validation::check_post_content,
    xrpl::{explorer_url, is_valid_classic_address, POST_BURN_AMOUNT},
};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;

const INSUFFICIENT_BALANCE: &str =
    "Insufficient TULDOK balance. You need at least 1 TULDOK to create a post.";

/// Publish a post, burning 1 TULDOK from the author's wallet.
#[utoipa::path(
    post,
    path = "/api/post",
    tag = "Posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<CreatedPostData>),
        (status = 400, description = "Invalid content or insufficient balance"),
        (status = 401, description = "Missing or invalid session token"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Burn failed"),
    ),
    security(("bearer" = []))
)]
pub async fn create_post(
    State(state): State<AppState>,
    Auth(caller): Auth,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedPostData>>), ApiError> {
    let content = request.content.as_deref().unwrap_or_default();
    check_post_content(content).map_err(|e| ApiError::bad_request(e.message()))?;

    let user = state
        .users()
        .get(caller.user_id)
        .map_err(|e| storage_error("Failed to create post", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.balance_tuldok < POST_BURN_AMOUNT {
        return Err(ApiError::bad_request(INSUFFICIENT_BALANCE));
    }

    let receipt = state
        .burner
        .burn(&user.wallet_address, POST_BURN_AMOUNT)
        .await
        .map_err(|e| {
            error!(user_id = user.id, error = %e, "TULDOK burn failed");
            ApiError::internal("Failed to process TULDOK burn transaction")
        })?;

    let created = state
        .posts()
        .create_with_burn(
            user.id,
            content,
            &PostBurn {
                tx_hash: receipt.tx_hash,
                ledger_index: receipt.ledger_index,
                amount: receipt.amount,
            },
        )
        .map_err(|e| match e {
            DbError::InsufficientBalance { .. } => ApiError::bad_request(INSUFFICIENT_BALANCE),
            other => storage_error("Failed to create post", other),
        })?;

    let post = created.post;
    info!(
        post_id = post.id,
        user_id = user.id,
        tx_hash = %post.transaction_hash,
        "Post created"
    );

    let data = CreatedPostData {
        post_id: post.id,
        ledger_url: explorer_url(&post.transaction_hash),
        content: post.content,
        transaction_hash: post.transaction_hash,
        ledger_index: post.ledger_index,
        remaining_balance: created.author.balance_tuldok,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Post created successfully! 1 TULDOK burned.",
            data,
        )),
    ))
}

/// Newest-first feed with pagination.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "Feed page", body = ApiResponse<FeedPage>),
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<ApiResponse<FeedPage>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let posts = state.posts();
    let total = posts
        .count()
        .map_err(|e| storage_error("Failed to fetch posts", e))?;
    let feed = posts
        .feed_page(page, limit)
        .map_err(|e| storage_error("Failed to fetch posts", e))?;

    Ok(Json(ApiResponse::data(FeedPage {
        posts: feed.into_iter().map(PostView::from).collect(),
        pagination: Pagination::new(page, limit, total),
    })))
}

/// Every post of one wallet, newest first.
#[utoipa::path(
    get,
    path = "/api/posts/{wallet_address}",
    tag = "Posts",
    params(
        ("wallet_address" = String, Path, description = "XRPL classic address")
    ),
    responses(
        (status = 200, description = "Posts of the wallet", body = ApiResponse<WalletPosts>),
        (status = 400, description = "Invalid wallet address"),
    )
)]
pub async fn wallet_posts(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<WalletPosts>>, ApiError> {
    if !is_valid_classic_address(&wallet_address) {
        return Err(ApiError::bad_request("Invalid XRPL wallet address"));
    }

    let posts: Vec<PostView> = state
        .posts()
        .list_by_wallet(&wallet_address)
        .map_err(|e| storage_error("Failed to fetch user posts", e))?
        .into_iter()
        .map(PostView::from)
        .collect();

    Ok(Json(ApiResponse::data(WalletPosts {
        wallet_address,
        total_posts: posts.len(),
        posts,
    })))
}
