// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Repository layer providing typed access to the social database.
//!
//! Each repository borrows the [`SocialDatabase`](super::SocialDatabase) and
//! provides the operations for one entity type. Operations spanning several
//! tables run inside a single redb write transaction.

pub mod posts;
pub mod transactions;
pub mod users;

pub use posts::{CreatedPost, FeedPost, PostBurn, PostRepository, StoredPost};
pub use transactions::{StoredTransaction, TransactionRepository, TxKind, TxStatus};
pub use users::{token_digest, NewUser, StoredUser, UserRepository};
