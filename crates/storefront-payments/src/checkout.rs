//! Stripe Checkout Integration
//!
//! Embedded checkout is the default: the session's client secret is mounted
//! in our payment page. `uiMode: "hosted"` switches to a redirect to Stripe's
//! hosted page.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::{PackageId, RetryPolicy};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, CheckoutSessionUiMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, StripeError,
};

use crate::error::{PaymentError, Result};
use crate::pricing::PriceTable;
use crate::provider::{CreatedSession, NewSession, PaymentProvider, UiMode, is_valid_session_id};
use crate::session::{SESSION_EXPANSIONS, SessionSnapshot};

/// Origin used when the client does not send one
pub const DEFAULT_ORIGIN: &str = "https://example.com";

/// Stripe connection settings
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    pub retry: RetryPolicy,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            timeout_secs: 20,
            retry: RetryPolicy::default(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("STRIPE_SECRET_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;

        let mut config = Self::new(secret_key);
        if let Some(timeout) = lookup("STRIPE_TIMEOUT_SECS").and_then(|t| t.parse().ok()) {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }
}

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self::from_config(&StripeConfig::new(secret_key))
    }

    pub fn from_config(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            timeout: Duration::from_secs(config.timeout_secs),
            retry: config.retry.clone(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&StripeConfig::from_env()?))
    }

    /// Get the underlying Stripe client
    pub const fn inner(&self) -> &Client {
        &self.client
    }

    async fn call<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StripeError>>,
    {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| PaymentError::Stripe {
                message: format!("request timed out after {:?}", self.timeout),
                retryable: true,
            })?
            .map_err(PaymentError::from)
    }

    async fn create_once(&self, request: &NewSession) -> Result<StripeCheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.metadata = Some(request.metadata.clone());
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(request.price.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);

        match request.ui_mode {
            UiMode::Embedded => {
                params.ui_mode = Some(CheckoutSessionUiMode::Embedded);
                params.return_url = Some(&request.success_url);
            }
            UiMode::Hosted => {
                params.success_url = Some(&request.success_url);
                params.cancel_url = Some(&request.cancel_url);
            }
        }

        self.call(StripeCheckoutSession::create(&self.client, params)).await
    }

    async fn retrieve_once(&self, session_id: &str) -> Result<SessionSnapshot> {
        let path = format!("/checkout/sessions/{session_id}");
        self.call(self.client.get_query(&path, ExpandParams { expand: SESSION_EXPANSIONS }))
            .await
    }
}

#[derive(Serialize)]
struct ExpandParams<'a> {
    expand: &'a [&'a str],
}

#[async_trait]
impl PaymentProvider for StripeClient {
    fn name(&self) -> &str {
        "stripe"
    }

    async fn create_session(&self, params: &NewSession) -> Result<CreatedSession> {
        let session = self
            .retry
            .run("stripe.checkout.sessions.create", || self.create_once(params))
            .await?;
        let id = session.id.to_string();

        match params.ui_mode {
            UiMode::Embedded => {
                let client_secret = session
                    .client_secret
                    .ok_or_else(|| PaymentError::Stripe {
                        message: "No client secret returned".into(),
                        retryable: false,
                    })?;
                Ok(CreatedSession::Embedded { id, client_secret })
            }
            UiMode::Hosted => {
                let url = session.url.ok_or_else(|| PaymentError::Stripe {
                    message: "No checkout URL returned".into(),
                    retryable: false,
                })?;
                Ok(CreatedSession::Hosted { id, url })
            }
        }
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        if !is_valid_session_id(session_id) {
            return Err(PaymentError::InvalidSessionId(session_id.to_string()));
        }
        self.retry
            .run("stripe.checkout.sessions.retrieve", || self.retrieve_once(session_id))
            .await
    }
}

/// Body of a checkout request from the payment page
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Package identifier (`starter`, `growth`, `scale`)
    #[serde(default, alias = "package")]
    pub slug: Option<String>,

    /// `null` and a missing field both mean no rush
    #[serde(default)]
    pub rush: Option<bool>,

    /// Site origin the customer is on, e.g. `https://citeks.net`
    #[serde(default)]
    pub origin: Option<String>,

    /// `"hosted"` or anything else for embedded
    #[serde(default)]
    pub ui_mode: Option<String>,
}

impl CheckoutRequest {
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }

    pub fn is_rush(&self) -> bool {
        self.rush.unwrap_or(false)
    }
}

/// Redirect targets anchored at the site origin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success: String,
    pub cancel: String,
}

impl CheckoutUrls {
    pub fn build(origin: Option<&str>, default_origin: &str, package: PackageId, rush: bool) -> Self {
        let origin = origin
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(default_origin)
            .trim_end_matches('/');

        Self {
            success: format!("{origin}/#/thank-you?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel: format!("{origin}/#/pay/{package}?rush={}", if rush { "1" } else { "0" }),
        }
    }
}

/// Creates checkout sessions for catalog packages
pub struct CheckoutService<P: ?Sized> {
    provider: Arc<P>,
    prices: Arc<PriceTable>,
    default_origin: String,
}

impl<P: PaymentProvider + ?Sized> CheckoutService<P> {
    pub fn new(provider: Arc<P>, prices: Arc<PriceTable>, default_origin: impl Into<String>) -> Self {
        Self {
            provider,
            prices,
            default_origin: default_origin.into(),
        }
    }

    /// Resolve the price, then open a session with the provider.
    ///
    /// Price resolution failures return before any provider call.
    pub async fn create(&self, request: &CheckoutRequest) -> Result<CreatedSession> {
        let rush = request.is_rush();
        let (package, price) = self.prices.resolve(request.slug(), rush)?;
        let ui_mode = UiMode::from_request(request.ui_mode.as_deref());
        let urls = CheckoutUrls::build(request.origin.as_deref(), &self.default_origin, package, rush);

        let mut metadata = HashMap::new();
        metadata.insert("package".to_string(), package.as_str().to_string());
        metadata.insert("rush".to_string(), rush.to_string());

        let params = NewSession {
            price: price.to_string(),
            ui_mode,
            success_url: urls.success,
            cancel_url: urls.cancel,
            metadata,
        };

        let session = self.provider.create_session(&params).await?;

        tracing::info!(
            provider = self.provider.name(),
            session_id = session.id(),
            package = %package,
            rush,
            ui_mode = ?ui_mode,
            "Created checkout session"
        );

        Ok(session)
    }
}
