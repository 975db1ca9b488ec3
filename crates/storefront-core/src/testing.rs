//! In-memory doubles for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MailError, Result};
use crate::mail::{Email, Mailer};

/// Mailer that records every message instead of sending it.
///
/// Recipients listed in `failing` are rejected with a permanent error, which
/// lets tests exercise partial delivery failures.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    failing: Vec<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message addressed to `recipient`
    pub fn failing_for(recipient: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: vec![recipient.into()],
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<Email> {
        self.sent()
            .into_iter()
            .filter(|e| e.to.iter().any(|to| to == recipient))
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;
        if email.to.iter().any(|to| self.failing.contains(to)) {
            return Err(MailError::Rejected {
                status: 422,
                body: "recipient rejected".into(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}
