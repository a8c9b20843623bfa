//! Outbound transactional mail.
//!
//! In development (no `RESEND_API_KEY`), messages are logged instead of
//! sent. In production they go through the Resend HTTP API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{MailConfig, MAIL_TIMEOUT_SECONDS, RESEND_API_URL};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Mail templates compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Activation link for a fresh or re-invited account
    UserInvitation,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::UserInvitation => "user_invitation",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            EmailTemplate::UserInvitation => "Activate your Inquiro account",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            EmailTemplate::UserInvitation => include_str!("../../templates/user_invitation.html"),
        }
    }

    /// Substitute `{{key}}` placeholders with HTML-escaped values.
    pub fn render(&self, data: &BTreeMap<String, String>) -> String {
        data.iter().fold(self.source().to_string(), |body, (key, value)| {
            body.replace(&format!("{{{{{}}}}}", key), &escape_html(value))
        })
    }
}

/// Delivery of rendered templates.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient_name: String,
        to: Vec<String>,
        data: BTreeMap<String, String>,
    ) -> AppResult<()>;
}

/// Pick the mailer for the current configuration.
pub fn from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    match &config.resend_api_key {
        Some(key) => Ok(Arc::new(ResendMailer::new(
            key.clone(),
            config.from_email.clone(),
        )?)),
        None => {
            tracing::warn!("RESEND_API_KEY not set - activation emails will be logged only");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: String,
}

/// Resend HTTP API client
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from_email: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(MAIL_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| AppError::internal(format!("Mail client error: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            from_email,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient_name: String,
        to: Vec<String>,
        data: BTreeMap<String, String>,
    ) -> AppResult<()> {
        let request = SendEmailRequest {
            from: &self.from_email,
            to: &to,
            subject: template.subject(),
            html: template.render(&data),
        };

        let resp = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(template = template.name(), error = %e, "Failed to reach mail API");
                AppError::InvitationNotSent(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                template = template.name(),
                status = status.as_u16(),
                body = %body,
                "Mail API rejected message"
            );
            return Err(AppError::InvitationNotSent(format!("status {}", status)));
        }

        tracing::info!(template = template.name(), recipient = %recipient_name, "Email sent");
        Ok(())
    }
}

/// Development mailer that logs instead of sending
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        template: EmailTemplate,
        recipient_name: String,
        to: Vec<String>,
        data: BTreeMap<String, String>,
    ) -> AppResult<()> {
        // Values can carry activation links; only their names are logged
        tracing::info!(
            template = template.name(),
            recipient = %recipient_name,
            to = ?to,
            fields = ?field_names(&data),
            "Email (dev mode - not sent)"
        );
        Ok(())
    }
}

fn field_names(data: &BTreeMap<String, String>) -> Vec<&str> {
    data.keys().map(String::as_str).collect()
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
