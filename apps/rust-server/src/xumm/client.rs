// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XUMM platform REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::payload::{CreatedPayload, PayloadRequest, PayloadStatus};
use crate::config::XummCredentials;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Wallet-payload signing service.
#[async_trait]
pub trait SigningService: Send + Sync {
    /// Register a transaction for wallet approval.
    async fn create_payload(&self, request: &PayloadRequest)
        -> Result<CreatedPayload, SigningError>;

    /// Fetch the current state of a payload.
    async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, SigningError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Signing service is not configured")]
    NotConfigured,

    #[error("Payload not found: {0}")]
    NotFound(String),

    #[error("Signing service request failed: {0}")]
    Request(String),

    #[error("Signing service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Signing service response was invalid: {0}")]
    InvalidResponse(String),
}

/// [`SigningService`] backed by the XUMM platform API.
pub struct XummClient {
    base_url: String,
    credentials: XummCredentials,
    http: Client,
}

impl XummClient {
    pub fn new(base_url: &str, credentials: XummCredentials) -> Result<Self, SigningError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SigningError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json(response: reqwest::Response, what: &str) -> Result<Value, SigningError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SigningError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SigningError::InvalidResponse(format!("{what} invalid JSON: {e}")))
    }
}

#[async_trait]
impl SigningService for XummClient {
    async fn create_payload(
        &self,
        request: &PayloadRequest,
    ) -> Result<CreatedPayload, SigningError> {
        let response = self
            .http
            .post(self.url("/payload"))
            .header("X-API-Key", &self.credentials.api_key)
            .header("X-API-Secret", &self.credentials.api_secret)
            .json(request)
            .send()
            .await
            .map_err(|e| SigningError::Request(format!("POST /payload failed: {e}")))?;

        let body = Self::read_json(response, "POST /payload").await?;
        serde_json::from_value(body)
            .map_err(|e| SigningError::InvalidResponse(format!("created payload: {e}")))
    }

    async fn payload_status(&self, uuid: &str) -> Result<PayloadStatus, SigningError> {
        let path = format!("/payload/{uuid}");
        let response = self
            .http
            .get(self.url(&path))
            .header("X-API-Key", &self.credentials.api_key)
            .header("X-API-Secret", &self.credentials.api_secret)
            .send()
            .await
            .map_err(|e| SigningError::Request(format!("GET {path} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SigningError::NotFound(uuid.to_string()));
        }

        let body = Self::read_json(response, &path).await?;
        parse_payload_status(uuid, &body)
    }
}

/// Parse `GET /payload/{uuid}`, mapping `meta.exists == false` to not-found.
fn parse_payload_status(uuid: &str, body: &Value) -> Result<PayloadStatus, SigningError> {
    let meta = body
        .get("meta")
        .ok_or_else(|| SigningError::InvalidResponse("missing meta".to_string()))?;
    let flag = |key: &str| meta.get(key).and_then(Value::as_bool).unwrap_or(false);

    if meta.get("exists").and_then(Value::as_bool) == Some(false) {
        return Err(SigningError::NotFound(uuid.to_string()));
    }

    let response = body.get("response");
    let text = |key: &str| {
        response
            .and_then(|r| r.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(PayloadStatus {
        resolved: flag("resolved"),
        signed: flag("signed"),
        cancelled: flag("cancelled"),
        expired: flag("expired"),
        txid: text("txid"),
        dispatched_result: text("dispatched_result"),
        account: text("account"),
    })
}

/// Stand-in used when no XUMM credentials are configured.
pub struct UnconfiguredSigning;

#[async_trait]
impl SigningService for UnconfiguredSigning {
    async fn create_payload(
        &self,
        _request: &PayloadRequest,
    ) -> Result<CreatedPayload, SigningError> {
        Err(SigningError::NotConfigured)
    }

    async fn payload_status(&self, _uuid: &str) -> Result<PayloadStatus, SigningError> {
        Err(SigningError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_signed_payload() {
        let body = json!({
            "meta": { "exists": true, "resolved": true, "signed": true, "cancelled": false, "expired": false },
            "response": { "txid": "ABCDEF", "dispatched_result": "tesSUCCESS", "account": "rAlice" }
        });
        let status = parse_payload_status("u-1", &body).unwrap();
        assert!(status.resolved && status.signed);
        assert_eq!(status.txid.as_deref(), Some("ABCDEF"));
        assert_eq!(status.dispatched_result.as_deref(), Some("tesSUCCESS"));
    }

    #[test]
    fn pending_payload_has_no_txid() {
        let body = json!({
            "meta": { "exists": true, "resolved": false, "signed": false },
            "response": { "txid": null, "dispatched_result": "" }
        });
        let status = parse_payload_status("u-1", &body).unwrap();
        assert!(!status.resolved);
        assert_eq!(status.txid, None);
        assert_eq!(status.dispatched_result, None);
    }

    #[test]
    fn missing_payload_is_not_found() {
        let body = json!({ "meta": { "exists": false } });
        assert!(matches!(
            parse_payload_status("u-404", &body),
            Err(SigningError::NotFound(uuid)) if uuid == "u-404"
        ));
        assert!(matches!(
            parse_payload_status("u-1", &json!({})),
            Err(SigningError::InvalidResponse(_))
        ));
    }

    #[test]
    fn created_payload_deserializes() {
        let body = json!({
            "uuid": "0c8d6c5a-7f0b-4c1e-9d4a-8e3b7a2f1d00",
            "next": { "always": "https://xumm.app/sign/0c8d" },
            "refs": {
                "qr_png": "https://xumm.app/sign/0c8d_q.png",
                "qr_matrix": "https://xumm.app/sign/0c8d_q.json",
                "websocket_status": "wss://xumm.app/sign/0c8d"
            },
            "pushed": false
        });
        let created: CreatedPayload = serde_json::from_value(body).unwrap();
        assert_eq!(created.refs.websocket_status, "wss://xumm.app/sign/0c8d");
        assert_eq!(created.next.always, "https://xumm.app/sign/0c8d");
    }

    #[tokio::test]
    async fn unconfigured_service_refuses() {
        let service = UnconfiguredSigning;
        assert!(matches!(
            service.payload_status("x").await,
            Err(SigningError::NotConfigured)
        ));
    }
}
