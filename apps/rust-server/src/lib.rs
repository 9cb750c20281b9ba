// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! TULDOK Social - XRPL social and payment backend
//!
//! Users register with an XRPL wallet, verify their email, and activate the
//! account by paying 33 TULDOK to the issuer. Verified users publish short
//! posts, each paid for by burning 1 TULDOK.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session tokens (HS256 JWT)
//! - `xrpl` - XRP Ledger JSON-RPC client, balances, payment checks
//! - `xumm` - Wallet signing payloads
//! - `storage` - Embedded database (redb)
//! - `mailer` - Verification email delivery

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod state;
pub mod storage;
pub mod validation;
pub mod xrpl;
pub mod xumm;

#[cfg(test)]
mod test_support;
