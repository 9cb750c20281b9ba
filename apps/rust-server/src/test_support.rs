// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! In-memory collaborators and fixtures shared by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::auth::SessionKeys;
use crate::config::DEFAULT_ISSUER_ADDRESS;
use crate::mailer::{EmailMessage, MailError, Mailer};
use crate::state::{AppState, Settings};
use crate::storage::{NewUser, SocialDatabase, StoredUser};
use crate::xrpl::{
    AccountBalances, AccountInfo, LedgerClient, LedgerError, LedgerTransaction, TrustLine,
    TULDOK_CURRENCY_HEX,
};
use crate::xumm::{
    CreatedPayload, PayloadNext, PayloadRefs, PayloadRequest, PayloadStatus, SigningError,
    SigningService,
};

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const ALICE: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
pub const BOB: &str = "rrrrrrrrrrrrrrrrrrrrBZbvji";

/// Fresh database in a temporary directory; keep the `TempDir` alive.
pub fn temp_database() -> (SocialDatabase, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = SocialDatabase::open(&dir.path().join("tuldok.redb")).unwrap();
    (db, dir)
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Default)]
struct LedgerData {
    accounts: HashMap<String, AccountInfo>,
    lines: HashMap<String, Vec<TrustLine>>,
    transactions: HashMap<String, LedgerTransaction>,
}

/// Ledger backed by maps. Unknown accounts report `actNotFound`.
#[derive(Default)]
pub struct FakeLedger {
    data: Mutex<LedgerData>,
    offline: AtomicBool,
}

impl FakeLedger {
    pub const LEDGER_INDEX: u64 = 90_000_000;

    /// Create `address` with `drops` XRP and, when given, a TULDOK trust line
    /// to the default issuer holding `tuldok`.
    pub fn fund(&self, address: &str, drops: &str, tuldok: Option<&str>) {
        let mut data = self.data.lock().unwrap();
        data.accounts.insert(
            address.to_string(),
            AccountInfo {
                account: address.to_string(),
                balance_drops: drops.to_string(),
            },
        );
        let lines = tuldok
            .map(|balance| {
                vec![TrustLine {
                    account: DEFAULT_ISSUER_ADDRESS.to_string(),
                    balance: balance.to_string(),
                    currency: TULDOK_CURRENCY_HEX.to_string(),
                    limit: "1000000000".to_string(),
                }]
            })
            .unwrap_or_default();
        data.lines.insert(address.to_string(), lines);
    }

    pub fn add_transaction(&self, tx: LedgerTransaction) {
        self.data
            .lock()
            .unwrap()
            .transactions
            .insert(tx.hash.clone(), tx);
    }

    /// When set, every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError> {
        self.check_online()?;
        self.data
            .lock()
            .unwrap()
            .accounts
            .get(address)
            .cloned()
            .ok_or(LedgerError::AccountNotFound)
    }

    async fn account_lines(&self, address: &str) -> Result<Vec<TrustLine>, LedgerError> {
        self.check_online()?;
        let data = self.data.lock().unwrap();
        if !data.accounts.contains_key(address) {
            return Err(LedgerError::AccountNotFound);
        }
        Ok(data.lines.get(address).cloned().unwrap_or_default())
    }

    async fn transaction(&self, hash: &str) -> Result<LedgerTransaction, LedgerError> {
        self.check_online()?;
        self.data
            .lock()
            .unwrap()
            .transactions
            .get(hash)
            .cloned()
            .ok_or(LedgerError::TransactionNotFound)
    }

    async fn validated_ledger_index(&self) -> Result<u64, LedgerError> {
        self.check_online()?;
        Ok(Self::LEDGER_INDEX)
    }

    fn endpoint(&self) -> &str {
        "fake://ledger"
    }
}

// =============================================================================
// Signing service
// =============================================================================

#[derive(Default)]
struct SigningData {
    scripts: HashMap<String, Vec<PayloadStatus>>,
    calls: HashMap<String, usize>,
    created: Vec<PayloadRequest>,
}

/// Signing service replaying scripted payload states.
#[derive(Default)]
pub struct FakeSigning {
    data: Mutex<SigningData>,
}

impl FakeSigning {
    /// Statuses returned for `uuid` in order; the last one repeats.
    pub fn script(&self, uuid: &str, statuses: Vec<PayloadStatus>) {
        self.data
            .lock()
            .unwrap()
            .scripts
            .insert(uuid.to_string(), statuses);
    }

    pub fn signed(txid: &str) -> PayloadStatus {
        PayloadStatus {
            resolved: true,
            signed: true,
            txid: Some(txid.to_string()),
            dispatched_result: Some("tesSUCCESS".to_string()),
            ..PayloadStatus::default()
        }
    }

    pub fn status_calls(&self, uuid: &str) -> usize {
        self.data.lock().unwrap().calls.get(uuid).copied().unwrap_or(0)
    }

    /// Payload requests received so far.
    pub fn created(&self) -> Vec<PayloadRequest> {
        self.data.lock().unwrap().created.clone()
    }
}

#[async_trait]
impl SigningService for FakeSigning {
    async fn create_payload(
        &self,
        request: &PayloadRequest,
    ) -> Result<CreatedPayload, SigningError> {
        let mut data = self.data.lock().unwrap();
        data.created.push(request.clone());
        let uuid = format!("payload-{}", data.created.len());
        Ok(CreatedPayload {
            next: PayloadNext {
                always: format!("https://xumm.app/sign/{uuid}"),
            },
            refs: PayloadRefs {
                qr_png: format!("https://xumm.app/sign/{uuid}_q.png"),
                qr_matrix: format!("https://xumm.app/sign/{uuid}_q.json"),
                websocket_status: format!("wss://xumm.app/sign/{uuid}"),
            },
            uuid,
        })
    }

    async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, SigningError> {
        let mut data = self.data.lock().unwrap();
        let call = {
            let count = data.calls.entry(uuid.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let script = data
            .scripts
            .get(uuid)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SigningError::NotFound(uuid.to_string()))?;
        Ok(script[(call - 1).min(script.len() - 1)].clone())
    }
}

// =============================================================================
// Mailer
// =============================================================================

/// Mailer that keeps sent messages and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Api {
                status: 503,
                body: "mail down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// =============================================================================
// Application state
// =============================================================================

/// [`AppState`] wired to fakes, with handles to inspect them.
pub struct TestHarness {
    pub state: AppState,
    pub ledger: Arc<FakeLedger>,
    pub signing: Arc<FakeSigning>,
    pub mailer: Arc<RecordingMailer>,
    _dir: TempDir,
}

pub fn test_settings() -> Settings {
    Settings {
        issuer_address: DEFAULT_ISSUER_ADDRESS.to_string(),
        frontend_url: "https://tuldok.test".to_string(),
        email_from: "no-reply@tuldok.test".to_string(),
        payload_timeout: Duration::from_millis(300),
        payload_poll_interval: Duration::from_millis(5),
        cors_allowed_origins: Vec::new(),
    }
}

pub fn test_state() -> TestHarness {
    let (db, dir) = temp_database();
    let ledger = Arc::new(FakeLedger::default());
    let signing = Arc::new(FakeSigning::default());
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState::new(
        db,
        ledger.clone(),
        SessionKeys::new(TEST_JWT_SECRET),
        test_settings(),
    )
    .with_signing(signing.clone())
    .with_mailer(mailer.clone());

    TestHarness {
        state,
        ledger,
        signing,
        mailer,
        _dir: dir,
    }
}

/// Store an unverified user for `wallet` with the given verification token.
pub fn seed_user(harness: &TestHarness, wallet: &str, email: &str, token: &str) -> StoredUser {
    harness
        .state
        .users()
        .create(&NewUser {
            wallet_address: wallet.to_string(),
            email: email.to_string(),
            phone: "+63 912 345 6789".to_string(),
            name: "Juan dela Cruz".to_string(),
            balances: AccountBalances::default(),
            verification_token: token.to_string(),
        })
        .unwrap()
}

/// Store a verified user for [`ALICE`] holding `tuldok` cached TULDOK.
pub fn seed_verified_user(harness: &TestHarness, tuldok: f64) -> StoredUser {
    let user = seed_user(harness, ALICE, "juan@example.com", &"a".repeat(64));
    harness
        .state
        .users()
        .update_balances(
            ALICE,
            &AccountBalances {
                xrp: 10.0,
                tuldok,
                has_trust_line: true,
            },
        )
        .unwrap();
    harness
        .state
        .users()
        .mark_verified(user.id, "SEEDVERIFY", 33.0, None)
        .unwrap()
}
