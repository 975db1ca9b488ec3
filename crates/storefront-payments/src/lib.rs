//! # storefront-payments
//!
//! Stripe checkout sessions, webhook verification and order notifications.
//!
//! ## Payment Lifecycle
//!
//! ```text
//! ┌──────────────┐  price   ┌──────────────┐  session  ┌─────────────────┐
//! │ Payment page │────────▶│ PriceTable   │─────────▶│ Stripe Checkout │
//! │ (slug, rush) │          └──────────────┘           └────────┬────────┘
//! └──────────────┘                                              │ webhook
//!        ▲                                                      ▼
//!        │ poll   ┌──────────────┐  re-fetch  ┌──────────────────────────┐
//!        └────────│ SessionStatus│◀──────────│ WebhookHandler           │
//!                 └──────────────┘            │ verify → filter → notify │
//!                                             └──────────────────────────┘
//! ```
//!
//! ### Embedded (default)
//!
//! The session's client secret is mounted in our page with Stripe.js; the
//! customer never leaves the site and lands on the thank-you route.
//!
//! ### Hosted
//!
//! `uiMode: "hosted"` returns a redirect URL to Stripe's hosted page, with
//! success and cancel URLs pointing back at the site.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_payments::{CheckoutRequest, CheckoutService, PriceTable, StripeClient};
//!
//! let provider = Arc::new(StripeClient::from_env()?);
//! let service = CheckoutService::new(provider, Arc::new(PriceTable::from_env()), "https://citeks.net");
//!
//! let session = service.create(&CheckoutRequest {
//!     slug: Some("starter".into()),
//!     ..Default::default()
//! }).await?;
//! ```

pub mod checkout;
pub mod error;
pub mod notification;
pub mod pricing;
pub mod provider;
pub mod session;
pub mod signature;
pub mod status;
pub mod transaction;
pub mod webhook;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use checkout::{CheckoutRequest, CheckoutService, CheckoutUrls, StripeClient, StripeConfig};
pub use error::{PaymentError, Result};
pub use notification::{NotificationReport, OrderNotifier, OrderSummary};
pub use pricing::PriceTable;
pub use provider::{CreatedSession, NewSession, PaymentProvider, UiMode};
pub use session::SessionSnapshot;
pub use signature::{SIGNATURE_HEADER, SignatureVerifier};
pub use status::{SessionStatus, session_status};
pub use transaction::{ReferenceKind, TransactionReference};
pub use webhook::{CHECKOUT_SESSION_COMPLETED, WebhookEvent, WebhookHandler, WebhookOutcome, decode_body};
