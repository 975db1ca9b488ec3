//! Mailer Strategy Pattern
//!
//! Transactional email goes through the [`Mailer`] trait so the webhook and
//! form flows can run against any email API, or a recording double in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MailError, Result};

/// A rendered transactional email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Sender mailbox, e.g. `"CITEKS <contact@citeks.net>"`
    pub from: String,

    pub to: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    pub subject: String,

    /// HTML body; callers escape every interpolated value
    pub html: String,
}

impl Email {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            cc: Vec::new(),
            reply_to: None,
            subject: subject.into(),
            html: html.into(),
        }
    }

    #[must_use]
    pub fn with_cc(mut self, cc: Option<&str>) -> Self {
        if let Some(cc) = cc.filter(|c| !c.trim().is_empty()) {
            self.cc.push(cc.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Reject messages the email API would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.to.iter().all(|r| r.trim().is_empty()) {
            return Err(MailError::InvalidMessage("no recipients".into()));
        }
        if self.from.trim().is_empty() {
            return Err(MailError::InvalidMessage("empty sender".into()));
        }
        Ok(())
    }
}

/// Common interface for email delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Human-readable provider name (for logs)
    fn name(&self) -> &str;

    /// Deliver one message. Implementations retry transient failures
    /// internally; an `Err` means the message was not accepted.
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Addresses and credentials for transactional mail
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_key: String,

    /// Sender mailbox (`FROM_EMAIL`)
    pub from: String,

    /// Operator inbox receiving internal copies (`TO_EMAIL`)
    pub operator: String,

    /// Optional copy on operator emails (`CC_EMAIL`)
    pub cc: Option<String>,

    /// Brand prefix used in subjects and signatures
    pub brand: String,
}

impl MailConfig {
    pub const DEFAULT_BRAND: &'static str = "CITEKS";

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup (environment, `.env`, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| MailError::Config(format!("{key} not set")))
        };

        Ok(Self {
            api_key: required("RESEND_API_KEY")?,
            from: required("FROM_EMAIL")?,
            operator: required("TO_EMAIL")?,
            cc: lookup("CC_EMAIL").filter(|v| !v.trim().is_empty()),
            brand: lookup("BRAND_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_BRAND.to_string()),
        })
    }
}
