// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XRP Ledger integration.
//!
//! - [`client`]: JSON-RPC reads (accounts, trust lines, transactions)
//! - [`balances`]: XRP/TULDOK balance lookup
//! - [`payment`]: verification payment matching
//! - [`burn`]: token burn on post creation

pub mod address;
pub mod balances;
pub mod burn;
pub mod client;
pub mod payment;
pub mod types;

pub use address::is_valid_classic_address;
pub use balances::fetch_account_balances;
pub use burn::{BurnError, BurnReceipt, SimulatedBurner, TokenBurner};
pub use client::{LedgerClient, LedgerError, XrplClient};
pub use payment::{check_verification_payment, PaymentMismatch};
pub use types::*;
