// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! Outbound email for account verification.
//!
//! [`HttpMailer`] posts messages to a transactional-mail HTTP API
//! (`MAIL_API_URL`). Without one configured, [`LogMailer`] writes the message
//! to the log so the verification link is still reachable in development.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::MailApiSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail request failed: {0}")]
    Request(String),

    #[error("Mail API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Link the user follows to confirm their email.
pub fn verification_link(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/verify-email?token={token}")
}

/// Minimal HTML escaping for user-provided text.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the verification email. `resend` selects the wording for a
/// user-requested resend.
pub fn verification_email(
    from: &str,
    to: &str,
    name: &str,
    link: &str,
    resend: bool,
) -> EmailMessage {
    let intro = if resend {
        "You requested a new verification email for your <b>TULDOK Social</b> account."
    } else {
        "Thank you for registering with <b>TULDOK Social</b>."
    };

    let html = format!(
        "<p>Hi {name},</p>\
         <p>{intro}</p>\
         <p>Please verify your email address by clicking the link below:</p>\
         <p><a href=\"{link}\">{link}</a></p>\
         <p>If you did not request this, please ignore this email.</p>",
        name = escape_html(name),
    );

    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Verify your email for TULDOK Social".to_string(),
        html,
    }
}

/// Sends mail through an HTTP JSON API.
pub struct HttpMailer {
    settings: MailApiSettings,
    http: Client,
}

impl HttpMailer {
    pub fn new(settings: MailApiSettings) -> Result<Self, MailError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MailError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { settings, http })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut request = self.http.post(&self.settings.endpoint).json(message);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::warn!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "Mail API not configured; email logged instead of sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_uses_frontend_url() {
        assert_eq!(
            verification_link("https://tuldok.social", "abc123"),
            "https://tuldok.social/verify-email?token=abc123"
        );
    }

    #[test]
    fn email_contains_link_and_escaped_name() {
        let message = verification_email(
            "no-reply@tuldok.social",
            "juan@example.com",
            "<Juan>",
            "https://tuldok.social/verify-email?token=t",
            false,
        );
        assert_eq!(message.to, "juan@example.com");
        assert!(message.html.contains("href=\"https://tuldok.social/verify-email?token=t\""));
        assert!(message.html.contains("&lt;Juan&gt;"));
        assert!(message.html.contains("Thank you for registering"));

        let resend = verification_email("f", "t", "n", "l", true);
        assert!(resend.html.contains("requested a new verification email"));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let message = verification_email("f", "t", "n", "l", false);
        assert!(LogMailer.send(&message).await.is_ok());
    }

    #[test]
    fn http_mailer_builds() {
        let mailer = HttpMailer::new(MailApiSettings {
            endpoint: "https://mail.example/send".to_string(),
            api_key: Some("key".to_string()),
        });
        assert!(mailer.is_ok());
    }
}
