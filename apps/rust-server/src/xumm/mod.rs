// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XUMM (Xaman) wallet-payload signing.
//!
//! The server never holds user keys. Payments are turned into payloads that
//! the user approves in the wallet app; the server only creates payloads and
//! watches their status.

pub mod client;
pub mod payload;
pub mod watcher;

pub use client::{SigningError, SigningService, UnconfiguredSigning, XummClient};
pub use payload::{
    send_token_payload, verification_payload, CreatedPayload, PayloadError, PayloadNext, PayloadRefs,
    PayloadRequest, PayloadStatus, SendTokenParams, TokenType,
};
pub use watcher::{PayloadOutcome, PayloadWatcher, DEFAULT_POLL_INTERVAL};
