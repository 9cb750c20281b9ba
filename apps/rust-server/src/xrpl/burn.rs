// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Token burn performed before a post is stored.
//!
//! Burning requires a signature from the poster's wallet, which this server
//! never holds. [`SimulatedBurner`] stands in for that step and produces a
//! clearly marked hash so simulated burns are never mistaken for ledger ones.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};

use super::client::LedgerClient;

/// Prefix carried by every hash produced by [`SimulatedBurner`].
pub const SIMULATED_HASH_PREFIX: &str = "simulated_";

/// Outcome of a burn.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnReceipt {
    pub tx_hash: String,
    pub ledger_index: Option<u64>,
    pub amount: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum BurnError {
    #[error("Burn failed: {0}")]
    Failed(String),
}

/// Burns TULDOK on behalf of a wallet.
#[async_trait]
pub trait TokenBurner: Send + Sync {
    async fn burn(&self, wallet_address: &str, amount: f64) -> Result<BurnReceipt, BurnError>;
}

/// Burner that records a burn without touching the ledger.
pub struct SimulatedBurner {
    ledger: Arc<dyn LedgerClient>,
}

impl SimulatedBurner {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl TokenBurner for SimulatedBurner {
    async fn burn(&self, wallet_address: &str, amount: f64) -> Result<BurnReceipt, BurnError> {
        let ledger_index = match self.ledger.validated_ledger_index().await {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!(error = %e, "ledger index unavailable for simulated burn");
                None
            }
        };

        let now = Utc::now();
        let nonce = uuid::Uuid::new_v4();
        let digest = Sha256::digest(format!(
            "{wallet_address}:{amount}:{}:{nonce}",
            now.timestamp_nanos_opt().unwrap_or_default()
        ));
        let tx_hash = format!(
            "{SIMULATED_HASH_PREFIX}{}_{}",
            now.timestamp_millis(),
            hex::encode(&digest[..8])
        );

        tracing::info!(
            wallet_address,
            amount,
            tx_hash = %tx_hash,
            "simulated TULDOK burn"
        );

        Ok(BurnReceipt {
            tx_hash,
            ledger_index,
            amount,
        })
    }
}
