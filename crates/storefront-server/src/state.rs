//! Application State

use std::sync::Arc;

use storefront_core::{MailConfig, Mailer};
use storefront_mail::{FormNotifier, ResendMailer};
use storefront_payments::{
    CheckoutService, OrderNotifier, PaymentProvider, PriceTable, SignatureVerifier, StripeClient, WebhookHandler,
};

use crate::config::Settings;

/// Mail transport plus the addresses it sends from and to
#[derive(Clone)]
pub struct MailContext {
    pub mailer: Arc<dyn Mailer>,
    pub config: MailConfig,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment provider (optional - None if not configured)
    pub payments: Option<Arc<dyn PaymentProvider>>,

    /// Stripe price ids per package and rush option
    pub prices: Arc<PriceTable>,

    /// Fallback origin for checkout redirect URLs
    pub site_origin: String,

    /// Webhook signature verifier (optional - None without a signing secret)
    pub webhook_verifier: Option<SignatureVerifier>,

    /// Email delivery (optional - None if not configured)
    pub mail: Option<MailContext>,
}

impl AppState {
    /// Build the production clients from settings
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let payments = settings
            .stripe
            .as_ref()
            .map(|config| Arc::new(StripeClient::from_config(config)) as Arc<dyn PaymentProvider>);

        let mail = match settings.mail {
            Some(config) => {
                let mailer: Arc<dyn Mailer> = Arc::new(ResendMailer::from_mail_config(&config)?);
                Some(MailContext { mailer, config })
            }
            None => None,
        };

        Ok(Self {
            payments,
            prices: Arc::new(settings.prices),
            site_origin: settings.site_origin,
            webhook_verifier: settings.webhook,
            mail,
        })
    }

    pub fn checkout(&self) -> Option<CheckoutService<dyn PaymentProvider>> {
        self.payments
            .as_ref()
            .map(|provider| CheckoutService::new(provider.clone(), self.prices.clone(), self.site_origin.clone()))
    }

    /// Webhook pipeline; `None` without a provider or signing secret
    pub fn webhook(&self) -> Option<WebhookHandler<dyn PaymentProvider>> {
        let provider = self.payments.as_ref()?;
        let verifier = self.webhook_verifier.as_ref()?;
        let notifier = self
            .mail
            .as_ref()
            .map(|mail| OrderNotifier::new(mail.mailer.clone(), mail.config.clone()));

        Some(WebhookHandler::new(provider.clone(), verifier.clone(), notifier))
    }

    pub fn form_notifier(&self) -> Option<FormNotifier> {
        self.mail
            .as_ref()
            .map(|mail| FormNotifier::new(mail.mailer.clone(), mail.config.clone()))
    }
}
