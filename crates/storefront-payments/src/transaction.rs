//! Transaction Reference Resolution
//!
//! Picks the single identifier shown to customers for a completed session:
//! payment intent, else charge, else the session itself (labelled as an order,
//! which covers sessions that never moved money, e.g. fully discounted ones).

use serde::Serialize;

use crate::session::{Expandable, PaymentIntent, SessionSnapshot};

/// What kind of identifier the reference is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReferenceKind {
    /// Backed by a payment intent or charge
    Transaction,
    /// Fallback to the checkout session id
    Order,
}

impl ReferenceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Transaction => "Transaction ID",
            Self::Order => "Order ID",
        }
    }
}

/// Best available reference for a session, plus the raw ids it came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionReference {
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    /// Status of the inline payment intent, when expanded
    pub payment_intent_status: Option<String>,
    pub kind: ReferenceKind,
    pub value: String,
}

impl TransactionReference {
    /// Resolve the reference. First match wins:
    /// payment intent id → latest charge → first listed charge → session id.
    pub fn resolve(session: &SessionSnapshot) -> Self {
        let (payment_intent_id, intent) = match &session.payment_intent {
            Some(Expandable::Object(intent)) => (non_empty(intent.id.as_deref()), Some(&**intent)),
            Some(Expandable::Id(id)) => (non_empty(Some(id.as_str())), None),
            None => (None, None),
        };

        let charge_id = intent.and_then(charge_of);
        let payment_intent_status = intent.and_then(|pi| non_empty(pi.status.as_deref()));

        let (kind, value) = match (&payment_intent_id, &charge_id) {
            (Some(pi), _) => (ReferenceKind::Transaction, pi.clone()),
            (None, Some(charge)) => (ReferenceKind::Transaction, charge.clone()),
            (None, None) => (ReferenceKind::Order, session.id.clone()),
        };

        Self {
            payment_intent_id,
            charge_id,
            payment_intent_status,
            kind,
            value,
        }
    }

    pub const fn label(&self) -> &'static str {
        self.kind.label()
    }
}

/// Latest charge wins over scanning the charges list.
fn charge_of(intent: &PaymentIntent) -> Option<String> {
    if let Some(latest) = intent.latest_charge.as_ref().and_then(Expandable::id) {
        return Some(latest.to_string());
    }
    intent
        .charges
        .as_ref()
        .and_then(|list| list.data.first())
        .and_then(|charge| non_empty(charge.id.as_deref()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(value: serde_json::Value) -> SessionSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_payment_intent_wins_over_charge() {
        let s = session(json!({
            "id": "cs_1",
            "payment_intent": {"id": "pi_1", "status": "succeeded", "latest_charge": "ch_1"},
        }));
        let reference = TransactionReference::resolve(&s);

        assert_eq!(reference.value, "pi_1");
        assert_eq!(reference.kind, ReferenceKind::Transaction);
        assert_eq!(reference.charge_id.as_deref(), Some("ch_1"));
        assert_eq!(reference.payment_intent_status.as_deref(), Some("succeeded"));
        assert_eq!(reference.label(), "Transaction ID");
    }

    #[test]
    fn test_bare_payment_intent_id_is_used_directly() {
        let s = session(json!({"id": "cs_2", "payment_intent": "pi_2"}));
        let reference = TransactionReference::resolve(&s);

        assert_eq!(reference.value, "pi_2");
        assert_eq!(reference.charge_id, None);
        assert_eq!(reference.payment_intent_status, None);
    }

    #[test]
    fn test_charge_used_when_intent_has_no_id() {
        let s = session(json!({
            "id": "cs_3",
            "payment_intent": {"latest_charge": {"id": "ch_3"}},
        }));
        let reference = TransactionReference::resolve(&s);

        assert_eq!(reference.payment_intent_id, None);
        assert_eq!(reference.value, "ch_3");
        assert_eq!(reference.kind, ReferenceKind::Transaction);
    }

    #[test]
    fn test_latest_charge_preferred_over_charges_list() {
        let s = session(json!({
            "id": "cs_4",
            "payment_intent": {
                "id": "pi_4",
                "latest_charge": {"id": "ch_latest"},
                "charges": {"data": [{"id": "ch_listed"}]},
            },
        }));
        assert_eq!(TransactionReference::resolve(&s).charge_id.as_deref(), Some("ch_latest"));
    }

    #[test]
    fn test_charges_list_fallback() {
        let s = session(json!({
            "id": "cs_5",
            "payment_intent": {"id": "pi_5", "charges": {"data": [{"id": "ch_first"}, {"id": "ch_second"}]}},
        }));
        assert_eq!(TransactionReference::resolve(&s).charge_id.as_deref(), Some("ch_first"));

        let empty = session(json!({
            "id": "cs_6",
            "payment_intent": {"id": "pi_6", "charges": {"data": []}},
        }));
        assert_eq!(TransactionReference::resolve(&empty).charge_id, None);
    }

    #[test]
    fn test_session_id_labelled_as_order() {
        let s = session(json!({"id": "cs_free", "amount_total": 0, "payment_intent": null}));
        let reference = TransactionReference::resolve(&s);

        assert_eq!(reference.kind, ReferenceKind::Order);
        assert_eq!(reference.value, "cs_free");
        assert_eq!(reference.label(), "Order ID");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let s = session(json!({
            "id": "cs_7",
            "payment_intent": {"id": "pi_7", "latest_charge": {"id": "ch_7"}},
        }));
        assert_eq!(TransactionReference::resolve(&s), TransactionReference::resolve(&s));
    }
}
