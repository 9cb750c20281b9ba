// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::SessionKeys;
use crate::config::AppConfig;
use crate::mailer::{LogMailer, Mailer};
use crate::storage::{PostRepository, SocialDatabase, TransactionRepository, UserRepository};
use crate::xrpl::{LedgerClient, SimulatedBurner, TokenBurner};
use crate::xumm::{SigningService, UnconfiguredSigning, DEFAULT_POLL_INTERVAL};

/// Request-independent settings handlers read.
#[derive(Debug, Clone)]
pub struct Settings {
    pub issuer_address: String,
    pub frontend_url: String,
    pub email_from: String,
    /// Longest a `payload-status` request waits for the wallet user.
    pub payload_timeout: Duration,
    pub payload_poll_interval: Duration,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            issuer_address: config.issuer_address.clone(),
            frontend_url: config.frontend_url.clone(),
            email_from: config.email_from.clone(),
            payload_timeout: config.payload_timeout,
            payload_poll_interval: DEFAULT_POLL_INTERVAL,
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SocialDatabase>,
    pub ledger: Arc<dyn LedgerClient>,
    pub signing: Arc<dyn SigningService>,
    pub mailer: Arc<dyn Mailer>,
    pub burner: Arc<dyn TokenBurner>,
    pub sessions: SessionKeys,
    pub settings: Arc<Settings>,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// State with the ledger simulating burns, no signing service and
    /// mail written to the log. Use the `with_*` methods to replace them.
    pub fn new(
        db: SocialDatabase,
        ledger: Arc<dyn LedgerClient>,
        sessions: SessionKeys,
        settings: Settings,
    ) -> Self {
        Self {
            db: Arc::new(db),
            burner: Arc::new(SimulatedBurner::new(ledger.clone())),
            ledger,
            signing: Arc::new(UnconfiguredSigning),
            mailer: Arc::new(LogMailer),
            sessions,
            settings: Arc::new(settings),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_signing(mut self, signing: Arc<dyn SigningService>) -> Self {
        self.signing = signing;
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_burner(mut self, burner: Arc<dyn TokenBurner>) -> Self {
        self.burner = burner;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.db)
    }

    pub fn posts(&self) -> PostRepository<'_> {
        PostRepository::new(&self.db)
    }

    pub fn transactions(&self) -> TransactionRepository<'_> {
        TransactionRepository::new(&self.db)
    }
}
