//! # storefront-mail
//!
//! Email delivery for the storefront.
//!
//! ## Providers
//!
//! - **Resend** (default): HTTP API at `https://api.resend.com/emails`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_core::{Email, MailConfig, Mailer};
//! use storefront_mail::ResendMailer;
//!
//! let config = MailConfig::from_env()?;
//! let mailer = ResendMailer::new(&config.api_key)?;
//! mailer.send(&Email::new(&config.from, &config.operator, "Hello", "<p>Hi</p>")).await?;
//! ```
//!
//! The [`forms`] module turns site form submissions into an operator summary
//! plus an acknowledgment for the visitor.

pub mod forms;
pub mod resend;

pub use forms::{FormKind, FormNotifier, FormOutcome, FormSubmission, SubmissionEnvelope};
pub use resend::{ResendConfig, ResendMailer};

// Re-export core types for convenience
pub use storefront_core::{Email, MailConfig, MailError, Mailer, Result};
