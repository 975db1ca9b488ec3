//! Server Settings
//!
//! Every integration is optional at startup. A missing piece is logged once
//! here and turns the endpoints that need it into 5xx responses.

use storefront_core::MailConfig;
use storefront_payments::{PriceTable, SignatureVerifier, StripeConfig, checkout::DEFAULT_ORIGIN};

/// Everything read from the environment at startup
#[derive(Clone)]
pub struct Settings {
    pub stripe: Option<StripeConfig>,
    pub prices: PriceTable,
    pub webhook: Option<SignatureVerifier>,
    pub mail: Option<MailConfig>,

    /// Fallback origin for checkout redirect URLs (`SITE_ORIGIN`)
    pub site_origin: String,

    pub bind_addr: String,

    /// SPA build served for unmatched routes (`STATIC_DIR`)
    pub static_dir: String,
}

impl Settings {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stripe = StripeConfig::from_lookup(&lookup)
            .inspect_err(|e| tracing::warn!(error = %e, "Stripe not configured, checkout disabled"))
            .ok();

        let prices = PriceTable::from_lookup(&lookup);
        let missing = prices.missing();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Some package prices are not configured");
        }

        let webhook = SignatureVerifier::from_lookup(&lookup)
            .inspect_err(|e| tracing::warn!(error = %e, "Webhook verification not configured"))
            .ok();

        let mail = MailConfig::from_lookup(&lookup)
            .inspect_err(|e| tracing::warn!(error = %e, "Email not configured, notifications disabled"))
            .ok();

        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            stripe,
            prices,
            webhook,
            mail,
            site_origin: non_empty("SITE_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            static_dir: non_empty("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
        }
    }
}
