//! Stripe Webhook Handling
//!
//! Verifies inbound events and reacts to `checkout.session.completed` by
//! re-fetching the session and sending order notifications. Every other
//! event type is acknowledged and dropped so Stripe stops redelivering it.
//!
//! Nothing is stored, so redelivery of the same event re-runs the whole
//! pipeline and sends the notifications again.

use std::borrow::Cow;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::notification::{NotificationReport, OrderNotifier, OrderSummary};
use crate::provider::PaymentProvider;
use crate::signature::SignatureVerifier;
use crate::transaction::TransactionReference;

/// The only event type that triggers processing
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Minimal event envelope; the embedded object is only trusted for its id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub id: Option<String>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))
    }

    /// Id of the object the event is about
    pub fn object_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.object.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_SESSION_COMPLETED
    }
}

/// Undo a base64 transport encoding so verification sees the signed bytes.
pub fn decode_body(body: &[u8], base64_encoded: bool) -> Result<Cow<'_, [u8]>> {
    if !base64_encoded {
        return Ok(Cow::Borrowed(body));
    }
    let trimmed = body.trim_ascii();
    STANDARD
        .decode(trimmed)
        .map(Cow::Owned)
        .map_err(|e| PaymentError::WebhookParse(format!("invalid base64 body: {e}")))
}

/// Result of a handled webhook delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Verified, but not an event we act on
    Ignored { event_type: String },

    /// Completed session re-fetched and notifications sent
    Processed {
        session_id: String,
        reference: TransactionReference,
        report: NotificationReport,
    },
}

/// Webhook handler
pub struct WebhookHandler<P: ?Sized> {
    provider: Arc<P>,
    verifier: SignatureVerifier,
    notifier: Option<OrderNotifier>,
}

impl<P: PaymentProvider + ?Sized> WebhookHandler<P> {
    /// `notifier` is `None` when email settings are incomplete; completed
    /// sessions then fail before the provider is called.
    pub fn new(provider: Arc<P>, verifier: SignatureVerifier, notifier: Option<OrderNotifier>) -> Self {
        Self {
            provider,
            verifier,
            notifier,
        }
    }

    /// Verify the signature and parse the event
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PaymentError::WebhookSignature("missing signature header".into()))?;

        self.verifier.verify(payload, signature)?;
        WebhookEvent::parse(payload)
    }

    /// Verify, filter and process one delivery
    pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookOutcome> {
        let event = match self.verify(payload, signature) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected webhook delivery");
                return Err(e);
            }
        };

        if !event.is_checkout_completed() {
            tracing::debug!(event_id = ?event.id, event_type = %event.event_type, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        }

        self.process(&event).await.inspect_err(|e| {
            tracing::error!(
                event_id = ?event.id,
                event_type = %event.event_type,
                session_id = ?event.object_id(),
                error = %e,
                "Webhook processing failed"
            );
        })
    }

    /// Process a verified completed-session event.
    ///
    /// The session is always re-fetched; the event copy may be trimmed.
    pub async fn process(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let session_id = event
            .object_id()
            .ok_or_else(|| PaymentError::IncompleteEvent("event has no session id".into()))?;

        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| PaymentError::MailConfig("RESEND_API_KEY, FROM_EMAIL or TO_EMAIL not set".into()))?;

        let session = self.provider.retrieve_session(session_id).await?;
        let summary = OrderSummary::from_session(&session);

        tracing::info!(
            event_id = ?event.id,
            session_id,
            package = %summary.timeline.label,
            rush = summary.rush,
            amount = %summary.amount,
            reference = %summary.reference.value,
            "Checkout session completed"
        );

        let report = notifier.notify(&summary).await?;

        Ok(WebhookOutcome::Processed {
            session_id: session.id,
            reference: summary.reference,
            report,
        })
    }
}
