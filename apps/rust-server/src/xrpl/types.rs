// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XRPL types and TULDOK token constants.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Human-readable TULDOK currency code.
pub const TULDOK_CURRENCY: &str = "TULDOK";

/// 160-bit hex currency code for `TULDOK` (codes longer than 3 chars).
pub const TULDOK_CURRENCY_HEX: &str = "54554C444F4B0000000000000000000000000000";

/// Amount of TULDOK a user pays the issuer to get verified.
pub const VERIFICATION_AMOUNT: f64 = 33.0;

/// String form of [`VERIFICATION_AMOUNT`] used in payloads.
pub const VERIFICATION_AMOUNT_STR: &str = "33";

/// TULDOK debited from the cached balance per post.
pub const POST_BURN_AMOUNT: f64 = 1.0;

/// 1 XRP = 1,000,000 drops.
pub const DROPS_PER_XRP: u64 = 1_000_000;

/// Number of decimals in an XRP amount.
pub const XRP_DECIMALS: usize = 6;

/// Default network fee in drops when the client does not supply one.
pub const DEFAULT_FEE_DROPS: &str = "12";

/// Successful engine result for applied transactions.
pub const TES_SUCCESS: &str = "tesSUCCESS";

/// Public explorer for mainnet transactions.
pub const LEDGER_EXPLORER_TX_URL: &str = "https://livenet.xrpl.org/transactions";

/// Returns `true` when `code` names the TULDOK currency in either notation.
pub fn is_tuldok_currency(code: &str) -> bool {
    code == TULDOK_CURRENCY || code.eq_ignore_ascii_case(TULDOK_CURRENCY_HEX)
}

/// Explorer link for a transaction hash.
pub fn explorer_url(tx_hash: &str) -> String {
    format!("{LEDGER_EXPLORER_TX_URL}/{tx_hash}")
}

/// An XRPL amount: XRP in drops (string) or an issued-currency object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Amount {
    Drops(String),
    Issued {
        currency: String,
        issuer: String,
        value: String,
    },
}

impl Amount {
    /// Issued-currency TULDOK amount.
    pub fn tuldok(value: impl Into<String>, issuer: impl Into<String>) -> Self {
        Amount::Issued {
            currency: TULDOK_CURRENCY_HEX.to_string(),
            issuer: issuer.into(),
            value: value.into(),
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Amount::Drops(_) => None,
            Amount::Issued { issuer, .. } => Some(issuer),
        }
    }
}

/// Subset of `account_info` used by this service.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub account: String,
    /// XRP balance in drops.
    pub balance_drops: String,
}

/// One entry of `account_lines`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrustLine {
    /// Counterparty (the issuer for a holder's line).
    pub account: String,
    pub balance: String,
    pub currency: String,
    #[serde(default)]
    pub limit: String,
}

/// Balances derived from the ledger for one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
pub struct AccountBalances {
    pub xrp: f64,
    pub tuldok: f64,
    pub has_trust_line: bool,
}

/// Subset of a `tx` lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTransaction {
    pub hash: String,
    pub transaction_type: String,
    pub account: String,
    pub destination: Option<String>,
    pub amount: Option<Amount>,
    pub delivered_amount: Option<Amount>,
    /// `meta.TransactionResult`, e.g. `tesSUCCESS`.
    pub result: Option<String>,
    pub ledger_index: Option<u64>,
    pub validated: bool,
}

impl LedgerTransaction {
    /// Delivered amount if present, else the requested amount.
    pub fn effective_amount(&self) -> Option<&Amount> {
        self.delivered_amount.as_ref().or(self.amount.as_ref())
    }
}

/// Error converting a decimal string into drops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a decimal number: {0}")]
    Malformed(String),
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount is too large")]
    Overflow,
}

/// Convert a drops string into an XRP value.
pub fn drops_to_xrp(drops: &str) -> Option<f64> {
    drops.trim().parse::<u64>().ok().map(|d| d as f64 / DROPS_PER_XRP as f64)
}

/// Convert a human XRP amount (e.g. `"1.5"`) into drops.
///
/// Digits past the sixth decimal are truncated.
pub fn xrp_to_drops(amount: &str) -> Result<u64, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(AmountError::Malformed(amount.to_string()));
    }

    let whole_drops = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| AmountError::Overflow)?
            .checked_mul(DROPS_PER_XRP)
            .ok_or(AmountError::Overflow)?
    };

    let mut fraction_digits: String = fraction.chars().take(XRP_DECIMALS).collect();
    while fraction_digits.len() < XRP_DECIMALS {
        fraction_digits.push('0');
    }
    let fraction_drops = fraction_digits
        .parse::<u64>()
        .map_err(|_| AmountError::Malformed(amount.to_string()))?;

    let drops = whole_drops
        .checked_add(fraction_drops)
        .ok_or(AmountError::Overflow)?;

    if drops == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(drops)
}

/// Validate an issued-currency value string and return it normalized.
pub fn parse_token_value(amount: &str) -> Result<String, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    let value: f64 = amount
        .parse()
        .map_err(|_| AmountError::Malformed(amount.to_string()))?;
    if !value.is_finite() {
        return Err(AmountError::Malformed(amount.to_string()));
    }
    if value <= 0.0 {
        return Err(AmountError::NotPositive);
    }
    Ok(amount.to_string())
}
