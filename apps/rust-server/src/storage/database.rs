// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Embedded social database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized StoredUser
//! - `user_by_wallet`: wallet address → user id
//! - `user_by_email`: lowercase email → user id
//! - `user_by_token`: sha256(verification token) hex → user id
//! - `posts`: post id → serialized StoredPost
//! - `post_feed_index`: `!timestamp_be|id_be` → post id
//! - `post_wallet_index`: `wallet|!timestamp_be|id_be` → post id
//! - `transactions`: tx hash → serialized StoredTransaction
//! - `tx_wallet_index`: `wallet|!timestamp_be|tx_hash` → kind
//! - `counters`: name → u64 (id sequences and row counts)

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

pub(super) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
pub(super) const USER_BY_WALLET: TableDefinition<&str, u64> = TableDefinition::new("user_by_wallet");
pub(super) const USER_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("user_by_email");
pub(super) const USER_BY_TOKEN: TableDefinition<&str, u64> = TableDefinition::new("user_by_token");

pub(super) const POSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("posts");
/// Newest-first feed order.
pub(super) const POST_FEED_INDEX: TableDefinition<&[u8], u64> =
    TableDefinition::new("post_feed_index");
pub(super) const POST_WALLET_INDEX: TableDefinition<&[u8], u64> =
    TableDefinition::new("post_wallet_index");

pub(super) const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");
pub(super) const TX_WALLET_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("tx_wallet_index");

pub(super) const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub(super) const USER_SEQUENCE: &str = "user_seq";
pub(super) const POST_SEQUENCE: &str = "post_seq";
pub(super) const POST_COUNT: &str = "post_count";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient balance: {available} < {required}")]
    InsufficientBalance { available: f64, required: f64 },
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Inverted big-endian timestamp so forward scans return newest first.
fn inverted_timestamp(timestamp_millis: i64) -> [u8; 8] {
    (!(timestamp_millis as u64)).to_be_bytes()
}

/// Key for `post_feed_index`: `!timestamp_be | id_be`.
pub(super) fn feed_key(timestamp_millis: i64, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&inverted_timestamp(timestamp_millis));
    key.extend_from_slice(&(!id).to_be_bytes());
    key
}

/// Composite key: `wallet | !timestamp_be | suffix`.
pub(super) fn wallet_key(wallet_address: &str, timestamp_millis: i64, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(wallet_address.len() + 1 + 8 + suffix.len());
    key.extend_from_slice(wallet_address.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&inverted_timestamp(timestamp_millis));
    key.extend_from_slice(suffix);
    key
}

/// `[start, end)` bounds covering every [`wallet_key`] of a wallet.
pub(super) fn wallet_range(wallet_address: &str) -> (Vec<u8>, Vec<u8>) {
    let mut start = Vec::with_capacity(wallet_address.len() + 1);
    start.extend_from_slice(wallet_address.as_bytes());
    start.push(b'|');

    let mut end = start.clone();
    // '|' + 1 sorts after every key with the '|' separator
    if let Some(last) = end.last_mut() {
        *last = b'|' + 1;
    }
    (start, end)
}

/// Strip the `wallet|timestamp` head from a [`wallet_key`].
pub(super) fn wallet_key_suffix<'k>(wallet_address: &str, key: &'k [u8]) -> Option<&'k [u8]> {
    key.get(wallet_address.len() + 1 + 8..)
}

// =============================================================================
// Counters
// =============================================================================

/// Increment `name` inside `txn` and return the new value.
pub(super) fn bump_counter(txn: &WriteTransaction, name: &str) -> DbResult<u64> {
    let mut table = txn.open_table(COUNTERS)?;
    let current = table.get(name)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(name, next)?;
    Ok(next)
}

// =============================================================================
// SocialDatabase
// =============================================================================

/// Embedded ACID database for users, posts and the transaction log.
pub struct SocialDatabase {
    db: Database,
}

impl SocialDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_BY_WALLET)?;
            let _ = write_txn.open_table(USER_BY_EMAIL)?;
            let _ = write_txn.open_table(USER_BY_TOKEN)?;
            let _ = write_txn.open_table(POSTS)?;
            let _ = write_txn.open_table(POST_FEED_INDEX)?;
            let _ = write_txn.open_table(POST_WALLET_INDEX)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(TX_WALLET_INDEX)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(super) fn raw(&self) -> &Database {
        &self.db
    }

    /// Read a counter value (0 when never written).
    pub(super) fn counter(&self, name: &str) -> DbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS)?;
        Ok(table.get(name)?.map(|v| v.value()).unwrap_or(0))
    }

    /// Readiness probe: open a read transaction and touch the users table.
    pub fn health_check(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        let _ = table.first()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (SocialDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = SocialDatabase::open(&dir.path().join("nested/test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn open_creates_parent_and_passes_health_check() {
        let (db, _dir) = temp_db();
        db.health_check().unwrap();
        assert_eq!(db.counter(POST_COUNT).unwrap(), 0);
    }

    #[test]
    fn counters_increment() {
        let (db, _dir) = temp_db();
        for expected in 1..=3 {
            let txn = db.raw().begin_write().unwrap();
            let value = bump_counter(&txn, USER_SEQUENCE).unwrap();
            txn.commit().unwrap();
            assert_eq!(value, expected);
        }
        assert_eq!(db.counter(USER_SEQUENCE).unwrap(), 3);
    }

    #[test]
    fn feed_keys_sort_newest_first() {
        let older = feed_key(1_000, 1);
        let newer = feed_key(2_000, 2);
        assert!(newer < older);

        // Same timestamp: higher id first
        assert!(feed_key(1_000, 5) < feed_key(1_000, 4));
    }

    #[test]
    fn wallet_keys_stay_in_range() {
        let wallet = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
        let (start, end) = wallet_range(wallet);
        let key = wallet_key(wallet, 1_700_000_000_000, b"HASH");
        assert!(key.as_slice() >= start.as_slice() && key.as_slice() < end.as_slice());
        assert_eq!(wallet_key_suffix(wallet, &key), Some(&b"HASH"[..]));

        // A longer wallet sharing the prefix must not fall in range
        let other = wallet_key(&format!("{wallet}X"), 1, b"H");
        assert!(!(other.as_slice() >= start.as_slice() && other.as_slice() < end.as_slice()));
    }
}
