//! # storefront-core
//!
//! Shared building blocks for the storefront services.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      storefront-server                        │
//! │  ┌──────────────────────┐        ┌─────────────────────────┐  │
//! │  │ storefront-payments  │        │    storefront-mail      │  │
//! │  │ (Stripe, webhooks)   │        │ (Resend, form notices)  │  │
//! │  └──────────┬───────────┘        └────────────┬────────────┘  │
//! │             └──────────┬──────────────────────┘               │
//! │                 ┌──────┴───────┐                              │
//! │                 │storefront-core│  catalog · Mailer · retry   │
//! │                 └──────────────┘                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `Mailer` trait lets the payment and form flows send email without
//! knowing which HTTP email API sits behind it.

pub mod catalog;
pub mod error;
pub mod html;
pub mod mail;
pub mod money;
pub mod retry;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use catalog::{Package, PackageId, Timeline};
pub use error::{MailError, Result};
pub use mail::{Email, MailConfig, Mailer};
pub use retry::{RetryPolicy, Retryable};
