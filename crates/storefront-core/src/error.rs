//! Error Types

use thiserror::Error;

use crate::retry::Retryable;

/// Result type alias for mail operations
pub type Result<T> = std::result::Result<T, MailError>;

/// Email delivery errors
#[derive(Error, Debug)]
pub enum MailError {
    /// Required mail settings are missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network failure or timeout talking to the email API
    #[error("Transport error: {0}")]
    Transport(String),

    /// The email API answered with a non-success status
    #[error("Email API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The message itself is unusable (no recipients, etc.)
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl MailError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Config(_) | Self::InvalidMessage(_) => false,
        }
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "Email service is not configured.",
            _ => "We could not send the email. Please try again later.",
        }
    }
}

impl Retryable for MailError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}
