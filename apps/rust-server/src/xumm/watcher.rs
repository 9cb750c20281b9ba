// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! # Payload Watcher
//!
//! Waits for a XUMM payload to be resolved by the wallet user.
//!
//! ## Strategy
//!
//! Every `poll_interval` (default 2 s) the watcher fetches the payload status
//! until one of:
//! 1. the payload resolves (signed, rejected, cancelled or expired),
//! 2. the overall `timeout` elapses,
//! 3. the server shutdown token is cancelled.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`, following the same pattern as
//! the other long-running loops in this crate.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::client::{SigningError, SigningService};
use crate::xrpl::TES_SUCCESS;

/// Default interval between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Final state of a watched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadOutcome {
    /// Signed and (when submitted) applied successfully.
    Signed { txid: String, account: Option<String> },
    /// Signed, but the submitted transaction failed on the ledger.
    Failed { txid: String, result: String },
    Rejected,
    Cancelled,
    Expired,
    TimedOut,
    Shutdown,
}

/// Polls a [`SigningService`] for one payload.
pub struct PayloadWatcher<'a> {
    service: &'a dyn SigningService,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a> PayloadWatcher<'a> {
    pub fn new(service: &'a dyn SigningService, timeout: Duration) -> Self {
        Self {
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Wait until the payload resolves, times out or `shutdown` fires.
    ///
    /// Transport errors end the wait; a missing payload surfaces as
    /// [`SigningError::NotFound`].
    pub async fn wait(
        &self,
        uuid: &str,
        shutdown: &CancellationToken,
    ) -> Result<PayloadOutcome, SigningError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            if shutdown.is_cancelled() {
                return Ok(PayloadOutcome::Shutdown);
            }

            let status = self.service.payload_status(uuid).await?;

            if status.signed {
                let txid = status.txid.unwrap_or_default();
                let outcome = match status.dispatched_result {
                    Some(result) if result != TES_SUCCESS => PayloadOutcome::Failed { txid, result },
                    _ => PayloadOutcome::Signed {
                        txid,
                        account: status.account,
                    },
                };
                info!(uuid, outcome = ?outcome, "Payload signed");
                return Ok(outcome);
            }
            if status.cancelled {
                return Ok(PayloadOutcome::Cancelled);
            }
            if status.expired {
                return Ok(PayloadOutcome::Expired);
            }
            if status.resolved {
                info!(uuid, "Payload rejected");
                return Ok(PayloadOutcome::Rejected);
            }

            let now = Instant::now();
            if now >= deadline {
                info!(uuid, timeout_secs = self.timeout.as_secs(), "Payload wait timed out");
                return Ok(PayloadOutcome::TimedOut);
            }

            debug!(uuid, "Payload pending");
            let nap = self.poll_interval.min(deadline - now);
            tokio::select! {
                _ = tokio::time::sleep(nap) => {},
                _ = shutdown.cancelled() => return Ok(PayloadOutcome::Shutdown),
            }
        }
    }
}
