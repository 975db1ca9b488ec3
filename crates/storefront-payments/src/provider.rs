//! Payment Provider Strategy
//!
//! Handlers talk to the payment provider through [`PaymentProvider`], built
//! once at startup and injected, so tests can swap in a double.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::SessionSnapshot;

/// Where the payment form is rendered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    /// Mounted in our page with a client secret
    #[default]
    Embedded,
    /// Redirect to Stripe's hosted page
    Hosted,
}

impl UiMode {
    /// `"hosted"` selects the redirect flow; anything else stays embedded.
    pub fn from_request(value: Option<&str>) -> Self {
        match value {
            Some("hosted") => Self::Hosted,
            _ => Self::Embedded,
        }
    }
}

/// Parameters for a one-time payment session with a single line item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSession {
    /// Stripe price id, quantity is always 1
    pub price: String,
    pub ui_mode: UiMode,
    /// Success URL (hosted) or return URL (embedded)
    pub success_url: String,
    /// Only used by the hosted flow
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

/// A freshly created session, shaped by its UI mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreatedSession {
    Embedded { id: String, client_secret: String },
    Hosted { id: String, url: String },
}

impl CreatedSession {
    pub fn id(&self) -> &str {
        match self {
            Self::Embedded { id, .. } | Self::Hosted { id, .. } => id,
        }
    }
}

/// Common interface for the payment provider
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider name (for logs)
    fn name(&self) -> &str;

    /// Create a checkout session
    async fn create_session(&self, params: &NewSession) -> Result<CreatedSession>;

    /// Re-fetch a session with [`crate::session::SESSION_EXPANSIONS`] applied
    async fn retrieve_session(&self, session_id: &str) -> Result<SessionSnapshot>;
}

/// Stripe session ids are `cs_` followed by `[A-Za-z0-9_]`.
pub fn is_valid_session_id(session_id: &str) -> bool {
    session_id.starts_with("cs_")
        && session_id.len() <= 255
        && session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
