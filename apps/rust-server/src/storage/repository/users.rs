// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! User repository.
//!
//! Wallet address, email and verification token each have a unique index
//! kept in the same write transaction as the user row. Verification tokens
//! are never stored in the clear; only their SHA-256 digest is indexed.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::super::database::{
    bump_counter, DbError, DbResult, SocialDatabase, USERS, USER_BY_EMAIL, USER_BY_TOKEN,
    USER_BY_WALLET, USER_SEQUENCE,
};
use super::transactions::{insert_in, StoredTransaction, TxKind, TxStatus};
use crate::xrpl::AccountBalances;

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: u64,
    pub wallet_address: String,
    /// Stored lowercase.
    pub email: String,
    pub phone: String,
    pub name: String,
    pub balance_xrp: f64,
    pub balance_tuldok: f64,
    #[serde(default)]
    pub has_trust_line: bool,
    pub verified: bool,
    /// SHA-256 hex digest of the current verification token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    fn apply_balances(&mut self, balances: &AccountBalances) {
        self.balance_xrp = balances.xrp;
        self.balance_tuldok = balances.tuldok;
        self.has_trust_line = balances.has_trust_line;
    }
}

/// Input for [`UserRepository::create`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub wallet_address: String,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub balances: AccountBalances,
    /// Raw verification token (hex); only its digest is persisted.
    pub verification_token: String,
}

/// Hex SHA-256 digest used to index verification tokens.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Load a user inside an open write transaction.
pub(super) fn read_user(txn: &WriteTransaction, id: u64) -> DbResult<StoredUser> {
    let table = txn.open_table(USERS)?;
    let bytes = table
        .get(id)?
        .ok_or_else(|| DbError::NotFound(format!("User {id}")))?
        .value()
        .to_vec();
    Ok(serde_json::from_slice(&bytes)?)
}

pub(super) fn write_user(txn: &WriteTransaction, user: &StoredUser) -> DbResult<()> {
    let json = serde_json::to_vec(user)?;
    let mut table = txn.open_table(USERS)?;
    table.insert(user.id, json.as_slice())?;
    Ok(())
}

/// Repository for user operations on the social database.
pub struct UserRepository<'a> {
    db: &'a SocialDatabase,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a SocialDatabase) -> Self {
        Self { db }
    }

    /// Insert a new unverified user.
    ///
    /// Returns [`DbError::Conflict`] when the wallet or email is taken.
    pub fn create(&self, new_user: &NewUser) -> DbResult<StoredUser> {
        let email = new_user.email.to_lowercase();
        let token_hash = token_digest(&new_user.verification_token);

        let write_txn = self.db.raw().begin_write()?;
        let user = {
            {
                let by_wallet = write_txn.open_table(USER_BY_WALLET)?;
                if by_wallet.get(new_user.wallet_address.as_str())?.is_some() {
                    return Err(DbError::Conflict("wallet_address".to_string()));
                }
                let by_email = write_txn.open_table(USER_BY_EMAIL)?;
                if by_email.get(email.as_str())?.is_some() {
                    return Err(DbError::Conflict("email".to_string()));
                }
            }

            let id = bump_counter(&write_txn, USER_SEQUENCE)?;
            let now = Utc::now();
            let mut user = StoredUser {
                id,
                wallet_address: new_user.wallet_address.clone(),
                email: email.clone(),
                phone: new_user.phone.clone(),
                name: new_user.name.clone(),
                balance_xrp: 0.0,
                balance_tuldok: 0.0,
                has_trust_line: false,
                verified: false,
                verification_token_hash: Some(token_hash.clone()),
                verification_tx_hash: None,
                email_confirmed_at: None,
                verified_at: None,
                created_at: now,
                updated_at: now,
            };
            user.apply_balances(&new_user.balances);

            write_user(&write_txn, &user)?;
            write_txn
                .open_table(USER_BY_WALLET)?
                .insert(user.wallet_address.as_str(), id)?;
            write_txn.open_table(USER_BY_EMAIL)?.insert(email.as_str(), id)?;
            write_txn
                .open_table(USER_BY_TOKEN)?
                .insert(token_hash.as_str(), id)?;
            user
        };
        write_txn.commit()?;

        Ok(user)
    }

    /// Look up a user by id.
    pub fn get(&self, id: u64) -> DbResult<Option<StoredUser>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_wallet(&self, wallet_address: &str) -> DbResult<Option<StoredUser>> {
        let id = {
            let read_txn = self.db.raw().begin_read()?;
            let table = read_txn.open_table(USER_BY_WALLET)?;
            table.get(wallet_address)?.map(|v| v.value())
        };
        match id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    pub fn find_by_email(&self, email: &str) -> DbResult<Option<StoredUser>> {
        let email = email.to_lowercase();
        let id = {
            let read_txn = self.db.raw().begin_read()?;
            let table = read_txn.open_table(USER_BY_EMAIL)?;
            table.get(email.as_str())?.map(|v| v.value())
        };
        match id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// Look up the user holding the raw verification `token`.
    pub fn find_by_verification_token(&self, token: &str) -> DbResult<Option<StoredUser>> {
        let digest = token_digest(token);
        let id = {
            let read_txn = self.db.raw().begin_read()?;
            let table = read_txn.open_table(USER_BY_TOKEN)?;
            table.get(digest.as_str())?.map(|v| v.value())
        };
        match id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// Replace the user's verification token; the previous one stops working.
    pub fn rotate_verification_token(&self, id: u64, token: &str) -> DbResult<StoredUser> {
        let digest = token_digest(token);

        let write_txn = self.db.raw().begin_write()?;
        let user = {
            let mut user = read_user(&write_txn, id)?;
            let mut by_token = write_txn.open_table(USER_BY_TOKEN)?;
            if let Some(old) = user.verification_token_hash.take() {
                by_token.remove(old.as_str())?;
            }
            by_token.insert(digest.as_str(), id)?;
            drop(by_token);

            user.verification_token_hash = Some(digest);
            user.updated_at = Utc::now();
            write_user(&write_txn, &user)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Record that the user followed the email link (first time only).
    pub fn confirm_email(&self, id: u64) -> DbResult<StoredUser> {
        let write_txn = self.db.raw().begin_write()?;
        let user = {
            let mut user = read_user(&write_txn, id)?;
            if user.email_confirmed_at.is_none() {
                let now = Utc::now();
                user.email_confirmed_at = Some(now);
                user.updated_at = now;
                write_user(&write_txn, &user)?;
            }
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Overwrite cached balances for the user owning `wallet_address`.
    pub fn update_balances(
        &self,
        wallet_address: &str,
        balances: &AccountBalances,
    ) -> DbResult<StoredUser> {
        let write_txn = self.db.raw().begin_write()?;
        let user = {
            let id = write_txn
                .open_table(USER_BY_WALLET)?
                .get(wallet_address)?
                .map(|v| v.value())
                .ok_or_else(|| DbError::NotFound(format!("User {wallet_address}")))?;

            let mut user = read_user(&write_txn, id)?;
            user.apply_balances(balances);
            user.updated_at = Utc::now();
            write_user(&write_txn, &user)?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Mark the user verified by `tx_hash` and log the verification payment.
    ///
    /// The verified check, the update and the log insert share one write
    /// transaction. Returns [`DbError::Conflict`] when the user is already
    /// verified or the hash was already recorded.
    pub fn mark_verified(
        &self,
        id: u64,
        tx_hash: &str,
        amount: f64,
        ledger_index: Option<u64>,
    ) -> DbResult<StoredUser> {
        let write_txn = self.db.raw().begin_write()?;
        let user = {
            let mut user = read_user(&write_txn, id)?;
            if user.verified {
                return Err(DbError::Conflict(format!("User {id} already verified")));
            }

            let now = Utc::now();
            user.verified = true;
            user.verification_tx_hash = Some(tx_hash.to_string());
            user.verified_at = Some(now);
            user.updated_at = now;
            write_user(&write_txn, &user)?;

            let mut log = StoredTransaction::new(
                tx_hash.to_string(),
                user.id,
                user.wallet_address.clone(),
                TxKind::Transfer,
                amount,
                ledger_index,
            );
            log.status = TxStatus::Confirmed;
            log.memo = Some("verification payment".to_string());
            insert_in(&write_txn, &log)?;

            user
        };
        write_txn.commit()?;
        Ok(user)
    }
}

// =============================================================================
// Tests
// =============================================================================
