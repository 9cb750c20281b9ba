// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Append-only log of ledger-affecting actions per user.
//!
//! Rows are keyed by transaction hash and written once; a second insert of
//! the same hash is rejected with [`DbError::Conflict`].

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    wallet_key, wallet_key_suffix, wallet_range, DbError, DbResult, SocialDatabase, TRANSACTIONS,
    TX_WALLET_INDEX,
};

/// Kind of ledger action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// TULDOK burned to publish a post
    Burn,
    /// Payment between accounts (e.g. the verification payment)
    Transfer,
    /// Tokens issued to an account
    Mint,
}

impl TxKind {
    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Burn => "burn",
            TxKind::Transfer => "transfer",
            TxKind::Mint => "mint",
        }
    }
}

/// Transaction status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Pending,
    Confirmed,
    Failed,
}

/// Stored transaction log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredTransaction {
    pub tx_hash: String,
    pub user_id: u64,
    pub wallet_address: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
    /// TULDOK amount
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<u64>,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredTransaction {
    /// New pending row stamped with the current time.
    pub fn new(
        tx_hash: String,
        user_id: u64,
        wallet_address: String,
        kind: TxKind,
        amount: f64,
        ledger_index: Option<u64>,
    ) -> Self {
        Self {
            tx_hash,
            user_id,
            wallet_address,
            kind,
            amount,
            ledger_index,
            status: TxStatus::Pending,
            memo: None,
            created_at: Utc::now(),
        }
    }
}

/// Insert `tx` and its wallet index entry inside an open write transaction.
pub(super) fn insert_in(txn: &WriteTransaction, tx: &StoredTransaction) -> DbResult<()> {
    let json = serde_json::to_vec(tx)?;

    let mut table = txn.open_table(TRANSACTIONS)?;
    if table.get(tx.tx_hash.as_str())?.is_some() {
        return Err(DbError::Conflict(format!("Transaction {}", tx.tx_hash)));
    }
    table.insert(tx.tx_hash.as_str(), json.as_slice())?;

    let key = wallet_key(
        &tx.wallet_address,
        tx.created_at.timestamp_millis(),
        tx.tx_hash.as_bytes(),
    );
    let mut index = txn.open_table(TX_WALLET_INDEX)?;
    index.insert(key.as_slice(), tx.kind.as_str())?;
    Ok(())
}

/// Repository for the transaction log.
pub struct TransactionRepository<'a> {
    db: &'a SocialDatabase,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(db: &'a SocialDatabase) -> Self {
        Self { db }
    }

    /// Append a row; rejects a hash that was already recorded.
    #[cfg(test)]
    pub fn record(&self, tx: &StoredTransaction) -> DbResult<()> {
        let write_txn = self.db.raw().begin_write()?;
        insert_in(&write_txn, tx)?;
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, tx_hash: &str) -> DbResult<Option<StoredTransaction>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(TRANSACTIONS)?;
        match table.get(tx_hash)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Newest-first rows for a wallet, at most `limit`.
    pub fn list_by_wallet(
        &self,
        wallet_address: &str,
        limit: usize,
    ) -> DbResult<Vec<StoredTransaction>> {
        let read_txn = self.db.raw().begin_read()?;
        let index = read_txn.open_table(TX_WALLET_INDEX)?;
        let table = read_txn.open_table(TRANSACTIONS)?;

        let (start, end) = wallet_range(wallet_address);
        let mut results = Vec::with_capacity(limit.min(64));

        for entry in index.range(start.as_slice()..end.as_slice())? {
            if results.len() >= limit {
                break;
            }
            let (key, _kind) = entry?;
            let key_bytes = key.value();
            let Some(hash) = wallet_key_suffix(wallet_address, key_bytes)
                .and_then(|suffix| std::str::from_utf8(suffix).ok())
            else {
                continue;
            };

            if let Some(value) = table.get(hash)? {
                results.push(serde_json::from_slice(value.value())?);
            }
        }

        Ok(results)
    }
}

// =============================================================================
// Tests
// =============================================================================
