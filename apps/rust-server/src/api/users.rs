// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Account endpoints: registration, login, email verification and profiles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, info, warn};

use super::extract::{ApiJson, ApiQuery};
use super::{ledger_unavailable, storage_error};
use crate::{
    error::ApiError,
    mailer::{verification_email, verification_link, MailError},
    models::{
        cached_balances, ApiResponse, Empty, LoginData, LoginRequest, RegisterRequest,
        RegisteredUser, ResendVerificationRequest, UnverifiedUser, UserProfile,
        VerifiedEmailUser, VerifyEmailQuery,
    },
    state::AppState,
    storage::{DbError, NewUser, StoredUser},
    validation::{is_valid_email, is_valid_phone, required},
    xrpl::{fetch_account_balances, is_valid_classic_address, AccountBalances, LedgerError},
};

/// Random bytes in a verification token (hex-encoded to 64 characters).
const VERIFICATION_TOKEN_BYTES: usize = 32;

const INVALID_WALLET: &str = "Invalid XRPL wallet address";

fn new_verification_token() -> Result<String, ApiError> {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ApiError::internal("Failed to generate verification token"))?;
    Ok(hex::encode(bytes))
}

async fn live_balances(
    state: &AppState,
    wallet_address: &str,
) -> Result<AccountBalances, LedgerError> {
    fetch_account_balances(
        state.ledger.as_ref(),
        wallet_address,
        &state.settings.issuer_address,
    )
    .await
}

async fn send_verification(
    state: &AppState,
    user: &StoredUser,
    token: &str,
    resend: bool,
) -> Result<(), MailError> {
    let link = verification_link(&state.settings.frontend_url, token);
    let message = verification_email(
        &state.settings.email_from,
        &user.email,
        &user.name,
        &link,
        resend,
    );
    state.mailer.send(&message).await
}

fn valid_wallet(wallet_address: &str) -> Result<(), ApiError> {
    if is_valid_classic_address(wallet_address) {
        Ok(())
    } else {
        Err(ApiError::bad_request(INVALID_WALLET))
    }
}

/// Register a new, unverified user.
///
/// Balances are read from the ledger when reachable; the verification email
/// is sent on a best-effort basis.
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = ApiResponse<RegisteredUser>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Wallet address or email already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), ApiError> {
    let (Some(wallet_address), Some(email), Some(phone), Some(name)) = (
        required(&request.wallet_address),
        required(&request.email),
        required(&request.phone),
        required(&request.name),
    ) else {
        return Err(ApiError::bad_request(
            "All fields are required: walletAddress, email, phone, name",
        ));
    };

    if !is_valid_email(email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if !is_valid_phone(phone) {
        return Err(ApiError::bad_request("Invalid phone number format"));
    }
    valid_wallet(wallet_address)?;

    const DUPLICATE: &str = "User with this wallet address or email already exists";
    let users = state.users();
    let wallet_taken = users
        .find_by_wallet(wallet_address)
        .map_err(|e| storage_error("Internal server error during registration", e))?
        .is_some();
    let email_taken = users
        .find_by_email(email)
        .map_err(|e| storage_error("Internal server error during registration", e))?
        .is_some();
    if wallet_taken || email_taken {
        return Err(ApiError::conflict(DUPLICATE));
    }

    let balances = match live_balances(&state, wallet_address).await {
        Ok(balances) => balances,
        Err(e) => {
            warn!(wallet_address, error = %e, "Balance lookup failed during registration");
            AccountBalances::default()
        }
    };

    let token = new_verification_token()?;
    let user = state
        .users()
        .create(&NewUser {
            wallet_address: wallet_address.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            name: name.to_string(),
            balances,
            verification_token: token.clone(),
        })
        .map_err(|e| match e {
            DbError::Conflict(_) => ApiError::conflict(DUPLICATE),
            other => storage_error("Internal server error during registration", other),
        })?;

    info!(user_id = user.id, wallet_address, "User registered");

    if let Err(e) = send_verification(&state, &user, &token, false).await {
        warn!(user_id = user.id, error = %e, "Verification email could not be sent");
    }

    let data = RegisteredUser {
        user_id: user.id,
        wallet_address: user.wallet_address,
        email: user.email,
        name: user.name,
        balance: balances.into(),
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Registration successful! Please check your email to verify your account.",
            data,
        )),
    ))
}

/// Log in with a verified wallet and receive a 7-day session token.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = ApiResponse<LoginData>),
        (status = 400, description = "Missing or invalid wallet address"),
        (status = 401, description = "Email not verified", body = ApiResponse<UnverifiedUser>),
        (status = 404, description = "User not found"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, ApiError> {
    let wallet_address = required(&request.wallet_address)
        .ok_or_else(|| ApiError::bad_request("Wallet address is required"))?;
    valid_wallet(wallet_address)?;

    if request.signature.is_some() {
        debug!(wallet_address, "Login signature supplied; not verified");
    }

    let user = state
        .users()
        .find_by_wallet(wallet_address)
        .map_err(|e| storage_error("Internal server error during login", e))?
        .ok_or_else(|| ApiError::not_found("User not found. Please register first."))?;

    if !user.verified {
        return Err(ApiError::unauthorized(
            "Email not verified. Please check your email and click the verification link.",
        )
        .with_data(UnverifiedUser::from(&user)));
    }

    let token = state.sessions.issue(&user).map_err(|e| {
        tracing::error!(user_id = user.id, error = %e, "Failed to issue session token");
        ApiError::internal("Internal server error during login")
    })?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::with_message(
        "Login successful!",
        LoginData {
            token,
            user: UserProfile::from(&user),
        },
    )))
}

/// Confirm the email address from the link in the verification email.
///
/// For accounts still awaiting payment the token is echoed back so the
/// client can continue to the payment step.
#[utoipa::path(
    get,
    path = "/api/verify-email",
    tag = "Users",
    params(VerifyEmailQuery),
    responses(
        (status = 200, description = "Email confirmed", body = ApiResponse<VerifiedEmailUser>),
        (status = 400, description = "Missing, invalid or expired token"),
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VerifyEmailQuery>,
) -> Result<Json<ApiResponse<VerifiedEmailUser>>, ApiError> {
    const FAILED: &str = "Internal server error during email verification.";

    let token = required(&query.token)
        .ok_or_else(|| ApiError::bad_request("Verification token is required."))?;

    let user = state
        .users()
        .find_by_verification_token(token)
        .map_err(|e| storage_error(FAILED, e))?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired verification token."))?;

    if user.verified {
        return Ok(Json(ApiResponse::with_message(
            "Email already verified.",
            VerifiedEmailUser::new(&user, cached_balances(&user), None),
        )));
    }

    let user = state
        .users()
        .confirm_email(user.id)
        .map_err(|e| storage_error(FAILED, e))?;

    let balances = match live_balances(&state, &user.wallet_address).await {
        Ok(balances) => balances,
        Err(e) => {
            warn!(user_id = user.id, error = %e, "Using cached balances for email verification");
            cached_balances(&user)
        }
    };

    info!(user_id = user.id, "Email confirmed");

    Ok(Json(ApiResponse::with_message(
        "Email verified successfully! You can now log in.",
        VerifiedEmailUser::new(&user, balances, Some(token.to_string())),
    )))
}

/// Issue a new verification token and email it.
#[utoipa::path(
    post,
    path = "/api/resend-verification",
    tag = "Users",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email sent", body = ApiResponse<Empty>),
        (status = 400, description = "Missing wallet or already verified"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Email could not be sent"),
    )
)]
pub async fn resend_verification(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResendVerificationRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    const FAILED: &str = "Failed to resend verification email";

    let wallet_address = required(&request.wallet_address)
        .ok_or_else(|| ApiError::bad_request("Wallet address is required"))?;

    let user = state
        .users()
        .find_by_wallet(wallet_address)
        .map_err(|e| storage_error(FAILED, e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.verified {
        return Err(ApiError::bad_request("Email is already verified"));
    }

    let token = new_verification_token()?;
    let user = state
        .users()
        .rotate_verification_token(user.id, &token)
        .map_err(|e| storage_error(FAILED, e))?;

    send_verification(&state, &user, &token, true)
        .await
        .map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Verification email failed");
            ApiError::internal(FAILED)
        })?;

    info!(user_id = user.id, "Verification email resent");
    Ok(Json(ApiResponse::message("Verification email sent successfully!")))
}

/// Public profile with live balances (cached when the ledger is unreachable).
#[utoipa::path(
    get,
    path = "/api/profile/{wallet_address}",
    tag = "Users",
    params(
        ("wallet_address" = String, Path, description = "XRPL classic address")
    ),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid wallet address"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    valid_wallet(&wallet_address)?;

    let user = state
        .users()
        .find_by_wallet(&wallet_address)
        .map_err(|e| storage_error("Internal server error", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let balances = match live_balances(&state, &wallet_address).await {
        Ok(balances) => balances,
        Err(e) => {
            warn!(wallet_address = %wallet_address, error = %e, "Using cached balances for profile");
            cached_balances(&user)
        }
    };

    Ok(Json(ApiResponse::data(UserProfile::with_balances(
        &user, balances,
    ))))
}

/// Re-read balances from the ledger and store them on the user.
#[utoipa::path(
    post,
    path = "/api/refresh-balances/{wallet_address}",
    tag = "Users",
    params(
        ("wallet_address" = String, Path, description = "XRPL classic address")
    ),
    responses(
        (status = 200, description = "Balances refreshed", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid wallet address"),
        (status = 404, description = "User not found"),
        (status = 503, description = "Ledger unavailable"),
    )
)]
pub async fn refresh_balances(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    const FAILED: &str = "Failed to refresh balances";

    valid_wallet(&wallet_address)?;

    state
        .users()
        .find_by_wallet(&wallet_address)
        .map_err(|e| storage_error(FAILED, e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let balances = live_balances(&state, &wallet_address)
        .await
        .map_err(ledger_unavailable)?;

    let user = state
        .users()
        .update_balances(&wallet_address, &balances)
        .map_err(|e| match e {
            DbError::NotFound(_) => ApiError::not_found("User not found"),
            other => storage_error(FAILED, other),
        })?;

    info!(
        user_id = user.id,
        xrp = balances.xrp,
        tuldok = balances.tuldok,
        "Balances refreshed"
    );

    Ok(Json(ApiResponse::with_message(
        "Balances refreshed successfully!",
        UserProfile::from(&user),
    )))
}
