// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded once at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `DATA_DIR` | Directory holding the redb database | `./data` |
//! | `JWT_SECRET` | HMAC secret for session tokens | dev secret (warned) |
//! | `XRPL_RPC_URL` | XRPL JSON-RPC endpoint | `https://xrplcluster.com/` |
//! | `TULDOK_ISSUER_ADDRESS` | Issuer of the TULDOK token | `r9qGMJMreNBYdEqJ7mNrUjyCj44fDUEe1G` |
//! | `XUMM_API_KEY` / `XUMM_API_SECRET` | XUMM platform credentials | Optional |
//! | `XUMM_API_URL` | XUMM platform base URL | `https://xumm.app/api/v1/platform` |
//! | `MAIL_API_URL` / `MAIL_API_KEY` | Transactional mail HTTP API | Optional |
//! | `EMAIL_FROM` | Sender address for verification mail | `no-reply@tuldok.social` |
//! | `FRONTEND_URL` | Base URL used in verification links | `http://localhost:3000` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origin list | permissive |
//! | `PAYLOAD_TIMEOUT_SECS` | Max wait for a XUMM payload to resolve | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Directory holding `tuldok.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const XRPL_RPC_URL_ENV: &str = "XRPL_RPC_URL";
pub const ISSUER_ADDRESS_ENV: &str = "TULDOK_ISSUER_ADDRESS";
pub const XUMM_API_KEY_ENV: &str = "XUMM_API_KEY";
pub const XUMM_API_SECRET_ENV: &str = "XUMM_API_SECRET";
pub const XUMM_API_URL_ENV: &str = "XUMM_API_URL";
pub const MAIL_API_URL_ENV: &str = "MAIL_API_URL";
pub const MAIL_API_KEY_ENV: &str = "MAIL_API_KEY";
pub const EMAIL_FROM_ENV: &str = "EMAIL_FROM";
pub const FRONTEND_URL_ENV: &str = "FRONTEND_URL";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const PAYLOAD_TIMEOUT_ENV: &str = "PAYLOAD_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_XRPL_RPC_URL: &str = "https://xrplcluster.com/";
pub const DEFAULT_ISSUER_ADDRESS: &str = "r9qGMJMreNBYdEqJ7mNrUjyCj44fDUEe1G";
pub const DEFAULT_XUMM_API_URL: &str = "https://xumm.app/api/v1/platform";
pub const DEFAULT_EMAIL_FROM: &str = "no-reply@tuldok.social";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_PAYLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Only for local development; a warning is logged when it is used.
const DEV_JWT_SECRET: &str = "tuldok-dev-secret-change-me";

/// Credentials for the XUMM platform API.
#[derive(Debug, Clone)]
pub struct XummCredentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Settings for the HTTP mail API.
#[derive(Debug, Clone)]
pub struct MailApiSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
}

/// Application configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    /// `true` when [`JWT_SECRET_ENV`] was not set.
    pub using_dev_jwt_secret: bool,
    pub xrpl_rpc_url: String,
    pub issuer_address: String,
    pub xumm_api_url: String,
    pub xumm: Option<XummCredentials>,
    pub mail: Option<MailApiSettings>,
    pub email_from: String,
    pub frontend_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub payload_timeout: Duration,
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get(JWT_SECRET_ENV);
        let using_dev_jwt_secret = jwt_secret.is_none();

        let xumm = match (get(XUMM_API_KEY_ENV), get(XUMM_API_SECRET_ENV)) {
            (Some(api_key), Some(api_secret)) => Some(XummCredentials { api_key, api_secret }),
            _ => None,
        };

        let mail = get(MAIL_API_URL_ENV).map(|endpoint| MailApiSettings {
            endpoint,
            api_key: get(MAIL_API_KEY_ENV),
        });

        let cors_allowed_origins = get(CORS_ALLOWED_ORIGINS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let payload_timeout = get(PAYLOAD_TIMEOUT_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PAYLOAD_TIMEOUT);

        Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get(PORT_ENV)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            jwt_secret: jwt_secret.unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            using_dev_jwt_secret,
            xrpl_rpc_url: get(XRPL_RPC_URL_ENV).unwrap_or_else(|| DEFAULT_XRPL_RPC_URL.to_string()),
            issuer_address: get(ISSUER_ADDRESS_ENV)
                .unwrap_or_else(|| DEFAULT_ISSUER_ADDRESS.to_string()),
            xumm_api_url: get(XUMM_API_URL_ENV).unwrap_or_else(|| DEFAULT_XUMM_API_URL.to_string()),
            xumm,
            mail,
            email_from: get(EMAIL_FROM_ENV).unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            frontend_url: get(FRONTEND_URL_ENV)
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            cors_allowed_origins,
            payload_timeout,
            log_json: get(LOG_FORMAT_ENV).is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// Path of the redb database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("tuldok.redb")
    }
}
