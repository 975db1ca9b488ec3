//! Payment Error Types

use storefront_core::{MailError, Retryable};
use stripe::StripeError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {message}")]
    Stripe { message: String, retryable: bool },

    /// Package identifier outside the catalog
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// Session status query without an id
    #[error("Missing session_id")]
    MissingSessionId,

    /// Session id with characters Stripe never issues
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Verified event without the data needed to process it
    #[error("Incomplete webhook event: {0}")]
    IncompleteEvent(String),

    /// An email could not be delivered after retries
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Email settings missing on a path that must notify
    #[error("Email configuration missing: {0}")]
    MailConfig(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Stripe { retryable: true, .. })
    }

    /// Client-side mistakes (4xx); everything else is a server failure
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPackage(_)
                | Self::MissingSessionId
                | Self::InvalidSessionId(_)
                | Self::WebhookSignature(_)
                | Self::WebhookParse(_)
        )
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Stripe { .. } => "Payment processing failed. Please try again.",
            Self::InvalidPackage(_) => "Invalid package",
            Self::MissingSessionId => "Missing session_id",
            Self::InvalidSessionId(_) => "Invalid session_id",
            Self::WebhookSignature(_) => "Invalid signature",
            Self::WebhookParse(_) => "Invalid payload",
            Self::Config(_) | Self::MailConfig(_) => "Service configuration error.",
            Self::Notification(_) | Self::IncompleteEvent(_) => "An error occurred processing your request.",
        }
    }
}

impl Retryable for PaymentError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

impl From<StripeError> for PaymentError {
    fn from(err: StripeError) -> Self {
        let retryable = match &err {
            StripeError::Stripe(request) => request.http_status == 429 || request.http_status >= 500,
            StripeError::Timeout | StripeError::ClientError(_) => true,
            _ => false,
        };
        Self::Stripe {
            message: err.to_string(),
            retryable,
        }
    }
}

impl From<MailError> for PaymentError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Config(msg) => Self::MailConfig(msg),
            other => Self::Notification(other.to_string()),
        }
    }
}
