// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Verification payment matching.

use super::types::{
    is_tuldok_currency, Amount, LedgerTransaction, TES_SUCCESS, VERIFICATION_AMOUNT,
};

/// Reason a transaction does not qualify as a verification payment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentMismatch {
    #[error("Transaction is not a payment")]
    NotPayment,

    #[error("Transaction is not in a validated ledger")]
    NotValidated,

    #[error("Transaction failed: {0}")]
    Failed(String),

    #[error("Payment must be in TULDOK from the configured issuer")]
    WrongCurrency,

    #[error("Payment amount {actual} is below the required {required}")]
    InsufficientAmount { actual: f64, required: f64 },

    #[error("Payment was not sent from the registered wallet")]
    WrongSender,
}

/// Check that `tx` is a validated payment of at least 33 TULDOK from `sender`
/// to `issuer`.
pub fn check_verification_payment(
    tx: &LedgerTransaction,
    sender: &str,
    issuer: &str,
) -> Result<(), PaymentMismatch> {
    if tx.transaction_type != "Payment" {
        return Err(PaymentMismatch::NotPayment);
    }
    if !tx.validated {
        return Err(PaymentMismatch::NotValidated);
    }

    match tx.result.as_deref() {
        Some(TES_SUCCESS) => {}
        Some(other) => return Err(PaymentMismatch::Failed(other.to_string())),
        None => return Err(PaymentMismatch::Failed("no result".to_string())),
    }

    let (currency, amount_issuer, value) = match tx.effective_amount() {
        Some(Amount::Issued {
            currency,
            issuer,
            value,
        }) => (currency, issuer, value),
        _ => return Err(PaymentMismatch::WrongCurrency),
    };

    if !is_tuldok_currency(currency) || amount_issuer != issuer {
        return Err(PaymentMismatch::WrongCurrency);
    }

    let actual = value.parse::<f64>().unwrap_or(0.0);
    if actual < VERIFICATION_AMOUNT {
        return Err(PaymentMismatch::InsufficientAmount {
            actual,
            required: VERIFICATION_AMOUNT,
        });
    }

    if tx.account != sender {
        return Err(PaymentMismatch::WrongSender);
    }

    Ok(())
}
