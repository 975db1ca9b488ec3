//! Session Status
//!
//! Read-only summary the thank-you page polls after checkout.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{PaymentError, Result};
use crate::provider::PaymentProvider;
use crate::session::SessionSnapshot;
use crate::transaction::TransactionReference;

/// Normalized session summary returned to the client
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub id: String,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub payment_intent_status: Option<String>,
    pub amount_total: Option<i64>,
    /// Only set when Stripe did not compute `amount_total`
    pub line_items_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl SessionStatus {
    pub fn from_session(session: SessionSnapshot) -> Self {
        let reference = TransactionReference::resolve(&session);
        let line_items_total = session.line_items_total();

        Self {
            id: session.id,
            status: session.status,
            payment_status: session.payment_status,
            payment_intent_id: reference.payment_intent_id,
            charge_id: reference.charge_id,
            payment_intent_status: reference.payment_intent_status,
            amount_total: session.amount_total,
            line_items_total,
            currency: session.currency,
            metadata: session.metadata.unwrap_or_default(),
        }
    }
}

/// Look up a session for the status endpoint.
///
/// A missing or blank id is rejected before the provider is called.
pub async fn session_status<P>(provider: &P, session_id: Option<&str>) -> Result<SessionStatus>
where
    P: PaymentProvider + ?Sized,
{
    let session_id = session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(PaymentError::MissingSessionId)?;

    let session = provider.retrieve_session(session_id).await?;
    tracing::debug!(
        session_id,
        status = ?session.status,
        payment_status = ?session.payment_status,
        "Loaded session status"
    );

    Ok(SessionStatus::from_session(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> SessionSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_line_items_total_derived_without_amount_total() {
        let provider = FakeProvider::new().with_session(snapshot(json!({
            "id": "cs_test_c",
            "status": "complete",
            "payment_status": "paid",
            "currency": "usd",
            "line_items": {"data": [
                {"quantity": 2, "price": {"unit_amount": 5000}},
                {"quantity": 1, "price": {"unit_amount": 3000}},
            ]},
        })));

        let status = session_status(&provider, Some("cs_test_c")).await.unwrap();
        assert_eq!(status.amount_total, None);
        assert_eq!(status.line_items_total, Some(13_000));
        assert_eq!(status.currency.as_deref(), Some("usd"));
    }

    #[tokio::test]
    async fn test_reference_fields_populated() {
        let provider = FakeProvider::new().with_session(snapshot(json!({
            "id": "cs_test_d",
            "amount_total": 230_000,
            "metadata": {"package": "growth", "rush": "false"},
            "payment_intent": {"id": "pi_d", "status": "succeeded", "latest_charge": {"id": "ch_d"}},
        })));

        let status = session_status(&provider, Some("cs_test_d")).await.unwrap();
        assert_eq!(status.payment_intent_id.as_deref(), Some("pi_d"));
        assert_eq!(status.charge_id.as_deref(), Some("ch_d"));
        assert_eq!(status.payment_intent_status.as_deref(), Some("succeeded"));
        assert_eq!(status.line_items_total, None);
        assert_eq!(status.metadata.get("package").map(String::as_str), Some("growth"));

        let body = serde_json::to_value(&status).unwrap();
        for key in [
            "id",
            "status",
            "payment_status",
            "payment_intent_id",
            "charge_id",
            "payment_intent_status",
            "amount_total",
            "line_items_total",
            "currency",
            "metadata",
        ] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
    }

    #[tokio::test]
    async fn test_missing_session_id() {
        let provider = FakeProvider::new();
        for id in [None, Some(""), Some("  ")] {
            assert!(matches!(
                session_status(&provider, id).await,
                Err(PaymentError::MissingSessionId)
            ));
        }
        assert_eq!(provider.retrieved(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = FakeProvider::new().failing();
        let err = session_status(&provider, Some("cs_test_missing")).await.unwrap_err();
        assert!(!err.is_client_error());
    }
}
