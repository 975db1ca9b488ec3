//! Checkout Session Model
//!
//! Typed view of an expanded Stripe checkout session. Stripe returns related
//! objects either as a bare id or, when expanded, inline; [`Expandable`] makes
//! that explicit instead of probing field types at runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Expansions requested whenever a session is re-fetched.
///
/// Older API versions also embed a `charges` list on the payment intent
/// without asking; [`PaymentIntent::charges`] picks it up when present.
pub const SESSION_EXPANSIONS: &[&str] = &["payment_intent.latest_charge", "line_items"];

/// Objects that carry a Stripe id
pub trait StripeObject {
    fn object_id(&self) -> Option<&str>;
}

/// A related object: bare id, or the expanded object itself
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T: StripeObject> Expandable<T> {
    /// Id of the related object, whichever form it arrived in
    pub fn id(&self) -> Option<&str> {
        let id = match self {
            Self::Id(id) => Some(id.as_str()),
            Self::Object(object) => object.object_id(),
        };
        id.filter(|id| !id.is_empty())
    }

    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Object(object) => Some(object),
        }
    }
}

/// Stripe list envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    #[serde(default)]
    pub id: Option<String>,
}

impl StripeObject for Charge {
    fn object_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(default)]
    pub id: Option<String>,

    /// e.g. `succeeded`, `processing`
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub latest_charge: Option<Expandable<Charge>>,

    /// Charges collection (older API versions)
    #[serde(default)]
    pub charges: Option<List<Charge>>,
}

impl StripeObject for PaymentIntent {
    fn object_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub id: Option<String>,

    /// Unit price in minor units
    #[serde(default)]
    pub unit_amount: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub quantity: Option<u64>,

    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub price: Option<Price>,
}

impl LineItem {
    /// Unit price × quantity, else the provider's line total, else zero
    pub fn subtotal(&self) -> i64 {
        let quantity = i64::try_from(self.quantity.unwrap_or(1)).unwrap_or(i64::MAX);
        match self.price.as_ref().and_then(|p| p.unit_amount) {
            Some(unit) => unit.saturating_mul(quantity),
            None => self.amount_total.unwrap_or(0),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Expanded checkout session as returned by `GET /v1/checkout/sessions/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,

    /// `open`, `complete` or `expired`
    #[serde(default)]
    pub status: Option<String>,

    /// `paid`, `unpaid` or `no_payment_required`
    #[serde(default)]
    pub payment_status: Option<String>,

    #[serde(default)]
    pub amount_total: Option<i64>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub customer_email: Option<String>,

    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,

    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,

    #[serde(default)]
    pub payment_intent: Option<Expandable<PaymentIntent>>,

    #[serde(default)]
    pub line_items: Option<List<LineItem>>,
}

impl SessionSnapshot {
    /// Bare session with only an id, as a starting point for tests and fakes
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: None,
            payment_status: None,
            amount_total: None,
            currency: None,
            customer_email: None,
            customer_details: None,
            metadata: None,
            payment_intent: None,
            line_items: None,
        }
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Package identifier from metadata (`package`, or the older `slug` key)
    pub fn package_metadata(&self) -> Option<&str> {
        self.metadata_value("package").or_else(|| self.metadata_value("slug"))
    }

    pub fn rush_requested(&self) -> bool {
        self.metadata_value("rush")
            .is_some_and(|r| r.eq_ignore_ascii_case("true"))
    }

    /// Customer email, preferring what the customer typed at checkout
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Inline payment intent, when expanded
    pub fn payment_intent_object(&self) -> Option<&PaymentIntent> {
        self.payment_intent.as_ref().and_then(Expandable::as_object)
    }

    /// Locally summed total, only when Stripe did not compute one
    pub fn line_items_total(&self) -> Option<i64> {
        if self.amount_total.is_some() {
            return None;
        }
        let items = &self.line_items.as_ref()?.data;
        if items.is_empty() {
            return None;
        }
        Some(items.iter().map(LineItem::subtotal).fold(0_i64, i64::saturating_add))
    }

    /// Stripe's total, else the local line item sum
    pub fn effective_amount(&self) -> Option<i64> {
        self.amount_total.or_else(|| self.line_items_total())
    }
}
