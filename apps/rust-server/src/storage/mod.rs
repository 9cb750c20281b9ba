// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! # Persistent Storage
//!
//! Users, posts and the transaction log live in a single embedded redb
//! database file (`{DATA_DIR}/tuldok.redb`).
//!
//! ## Guarantees
//!
//! - Wallet address and email are unique per user
//! - A transaction hash is recorded at most once
//! - A user is marked verified at most once
//! - A post, its balance debit and its burn row commit together or not at all

pub mod database;
pub mod repository;

pub use database::{DbError, DbResult, SocialDatabase};
pub use repository::{
    CreatedPost, FeedPost, NewUser, PostBurn, PostRepository, StoredPost, StoredTransaction,
    StoredUser, TransactionRepository, TxKind, TxStatus, UserRepository,
};
