// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Post repository.
//!
//! A post is stored together with the burn that paid for it: the post row,
//! its feed and wallet index entries, the author's balance debit and the
//! burn log row are written in one redb transaction.

use chrono::{DateTime, Utc};
use redb::{ReadOnlyTable, ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::super::database::{
    bump_counter, feed_key, wallet_key, wallet_range, DbError, DbResult, SocialDatabase, POSTS,
    POST_COUNT, POST_FEED_INDEX, POST_SEQUENCE, POST_WALLET_INDEX, USERS,
};
use super::transactions::{insert_in, StoredTransaction, TxKind};
use super::users::{read_user, write_user, StoredUser};

/// Stored post record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: u64,
    pub user_id: u64,
    pub wallet_address: String,
    pub content: String,
    pub transaction_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPost {
    pub post: StoredPost,
    pub author_name: String,
}

/// Burn that pays for a new post.
#[derive(Debug, Clone)]
pub struct PostBurn {
    pub tx_hash: String,
    pub ledger_index: Option<u64>,
    pub amount: f64,
}

/// Returned by [`PostRepository::create_with_burn`].
#[derive(Debug, Clone)]
pub struct CreatedPost {
    pub post: StoredPost,
    pub author: StoredUser,
}

fn author_name(users: &ReadOnlyTable<u64, &'static [u8]>, user_id: u64) -> DbResult<String> {
    match users.get(user_id)? {
        Some(value) => {
            let user: StoredUser = serde_json::from_slice(value.value())?;
            Ok(user.name)
        }
        None => Ok(String::new()),
    }
}

/// Repository for post operations on the social database.
pub struct PostRepository<'a> {
    db: &'a SocialDatabase,
}

impl<'a> PostRepository<'a> {
    pub fn new(db: &'a SocialDatabase) -> Self {
        Self { db }
    }

    /// Store a post paid for by `burn` and debit the author's cached balance.
    ///
    /// Fails with [`DbError::InsufficientBalance`] when the cached balance is
    /// below the burn amount; nothing is written in that case.
    pub fn create_with_burn(
        &self,
        user_id: u64,
        content: &str,
        burn: &PostBurn,
    ) -> DbResult<CreatedPost> {
        let write_txn = self.db.raw().begin_write()?;
        let created = {
            let mut author = read_user(&write_txn, user_id)?;
            if author.balance_tuldok < burn.amount {
                return Err(DbError::InsufficientBalance {
                    available: author.balance_tuldok,
                    required: burn.amount,
                });
            }

            let id = bump_counter(&write_txn, POST_SEQUENCE)?;
            bump_counter(&write_txn, POST_COUNT)?;

            let now = Utc::now();
            let post = StoredPost {
                id,
                user_id,
                wallet_address: author.wallet_address.clone(),
                content: content.to_string(),
                transaction_hash: burn.tx_hash.clone(),
                ledger_index: burn.ledger_index,
                created_at: now,
            };

            let json = serde_json::to_vec(&post)?;
            write_txn.open_table(POSTS)?.insert(id, json.as_slice())?;

            let millis = now.timestamp_millis();
            write_txn
                .open_table(POST_FEED_INDEX)?
                .insert(feed_key(millis, id).as_slice(), id)?;
            write_txn.open_table(POST_WALLET_INDEX)?.insert(
                wallet_key(&post.wallet_address, millis, &(!id).to_be_bytes()).as_slice(),
                id,
            )?;

            author.balance_tuldok -= burn.amount;
            author.updated_at = now;
            write_user(&write_txn, &author)?;

            let mut log = StoredTransaction::new(
                burn.tx_hash.clone(),
                user_id,
                author.wallet_address.clone(),
                TxKind::Burn,
                burn.amount,
                burn.ledger_index,
            );
            log.memo = Some(format!("post {id}"));
            log.created_at = now;
            insert_in(&write_txn, &log)?;

            CreatedPost { post, author }
        };
        write_txn.commit()?;
        Ok(created)
    }

    /// Total number of posts.
    pub fn count(&self) -> DbResult<u64> {
        self.db.counter(POST_COUNT)
    }

    /// One feed page, newest first. `page` is 1-based.
    pub fn feed_page(&self, page: u64, limit: u64) -> DbResult<Vec<FeedPost>> {
        let read_txn = self.db.raw().begin_read()?;
        let feed = read_txn.open_table(POST_FEED_INDEX)?;
        let posts = read_txn.open_table(POSTS)?;
        let users = read_txn.open_table(USERS)?;

        let offset = page.saturating_sub(1).saturating_mul(limit);
        let mut results = Vec::new();

        for entry in feed
            .iter()?
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
        {
            let (_key, id) = entry?;
            if let Some(value) = posts.get(id.value())? {
                let post: StoredPost = serde_json::from_slice(value.value())?;
                let author_name = author_name(&users, post.user_id)?;
                results.push(FeedPost { post, author_name });
            }
        }

        Ok(results)
    }

    /// Every post of a wallet, newest first.
    pub fn list_by_wallet(&self, wallet_address: &str) -> DbResult<Vec<FeedPost>> {
        let read_txn = self.db.raw().begin_read()?;
        let index = read_txn.open_table(POST_WALLET_INDEX)?;
        let posts = read_txn.open_table(POSTS)?;
        let users = read_txn.open_table(USERS)?;

        let (start, end) = wallet_range(wallet_address);
        let mut results = Vec::new();

        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_key, id) = entry?;
            if let Some(value) = posts.get(id.value())? {
                let post: StoredPost = serde_json::from_slice(value.value())?;
                let author_name = author_name(&users, post.user_id)?;
                results.push(FeedPost { post, author_name });
            }
        }

        Ok(results)
    }
}

// =============================================================================
// Tests
// =============================================================================
