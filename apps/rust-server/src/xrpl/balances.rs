// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XRP and TULDOK balance lookup for one wallet.

use super::client::{LedgerClient, LedgerError};
use super::types::{drops_to_xrp, is_tuldok_currency, AccountBalances, TrustLine};

/// Fetch native and TULDOK balances for `address`.
///
/// An account that does not exist on the ledger yet reports zero balances.
pub async fn fetch_account_balances(
    ledger: &dyn LedgerClient,
    address: &str,
    issuer: &str,
) -> Result<AccountBalances, LedgerError> {
    let info = match ledger.account_info(address).await {
        Ok(info) => info,
        Err(LedgerError::AccountNotFound) => return Ok(AccountBalances::default()),
        Err(e) => return Err(e),
    };

    let xrp = drops_to_xrp(&info.balance_drops).ok_or_else(|| {
        LedgerError::InvalidResponse(format!("invalid drops balance: {}", info.balance_drops))
    })?;

    let lines = ledger.account_lines(address).await?;
    let (tuldok, has_trust_line) = tuldok_balance(&lines, issuer);

    Ok(AccountBalances {
        xrp,
        tuldok,
        has_trust_line,
    })
}

/// Sum of TULDOK held on trust lines to `issuer`, and whether any such line exists.
fn tuldok_balance(lines: &[TrustLine], issuer: &str) -> (f64, bool) {
    let mut has_line = false;
    let mut total = 0.0;
    for line in lines
        .iter()
        .filter(|l| l.account == issuer && is_tuldok_currency(&l.currency))
    {
        has_line = true;
        total += line.balance.parse::<f64>().unwrap_or(0.0);
    }
    (total, has_line)
}
