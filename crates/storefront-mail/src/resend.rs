//! Resend Email Provider
//!
//! Implementation of `Mailer` over Resend's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use storefront_core::{
    error::{MailError, Result},
    mail::{Email, MailConfig, Mailer},
    retry::RetryPolicy,
};

/// Resend provider configuration
#[derive(Clone, Debug)]
pub struct ResendConfig {
    /// API key (`re_...`)
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

impl ResendConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.resend.com";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Resend mailer
#[derive(Debug)]
pub struct ResendMailer {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendMailer {
    /// Create a mailer with default settings
    pub fn new(api_key: &str) -> Result<Self> {
        Self::from_config(ResendConfig::new(api_key))
    }

    /// Create from configuration
    pub fn from_config(config: ResendConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(MailError::Config("RESEND_API_KEY not set".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from the shared mail configuration
    pub fn from_mail_config(mail: &MailConfig) -> Result<Self> {
        Self::new(&mail.api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, email: &Email) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Resend send failed");
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;

        self.config
            .retry
            .run("resend.send", || self.send_once(email))
            .await?;

        tracing::info!(subject = %email.subject, recipients = email.to.len(), "Email sent");
        Ok(())
    }
}
