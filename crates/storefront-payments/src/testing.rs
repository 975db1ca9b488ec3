//! In-memory payment provider and webhook fixtures for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::error::{PaymentError, Result};
use crate::provider::{CreatedSession, NewSession, PaymentProvider, UiMode, is_valid_session_id};
use crate::session::SessionSnapshot;
use crate::signature::SignatureVerifier;
use crate::webhook::CHECKOUT_SESSION_COMPLETED;

/// Provider double: serves canned sessions and records created ones
#[derive(Debug, Default)]
pub struct FakeProvider {
    sessions: Mutex<HashMap<String, SessionSnapshot>>,
    created: Mutex<Vec<NewSession>>,
    retrieved: AtomicUsize,
    failing: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(self, session: SessionSnapshot) -> Self {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(session.id.clone(), session);
        }
        self
    }

    /// Every call fails with a non-retryable upstream error
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Parameters of every session created so far
    pub fn created(&self) -> Vec<NewSession> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of retrieve calls
    pub fn retrieved(&self) -> usize {
        self.retrieved.load(Ordering::SeqCst)
    }

    fn upstream_error() -> PaymentError {
        PaymentError::Stripe {
            message: "upstream unavailable".into(),
            retryable: false,
        }
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn create_session(&self, params: &NewSession) -> Result<CreatedSession> {
        if self.failing {
            return Err(Self::upstream_error());
        }

        let id = match self.created.lock() {
            Ok(mut created) => {
                created.push(params.clone());
                format!("cs_test_fake_{}", created.len())
            }
            Err(_) => return Err(Self::upstream_error()),
        };

        Ok(match params.ui_mode {
            UiMode::Embedded => CreatedSession::Embedded {
                client_secret: format!("{id}_secret_fake"),
                id,
            },
            UiMode::Hosted => CreatedSession::Hosted {
                url: format!("https://checkout.stripe.com/c/pay/{id}"),
                id,
            },
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionSnapshot> {
        if !is_valid_session_id(session_id) {
            return Err(PaymentError::InvalidSessionId(session_id.to_string()));
        }
        self.retrieved.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::upstream_error());
        }
        self.sessions
            .lock()
            .ok()
            .and_then(|sessions| sessions.get(session_id).cloned())
            .ok_or_else(|| PaymentError::Stripe {
                message: format!("No such checkout.session: '{session_id}'"),
                retryable: false,
            })
    }
}

/// Event body of the given type about object `object_id`
pub fn event_payload(event_type: &str, object_id: &str) -> Vec<u8> {
    json!({
        "id": format!("evt_{object_id}"),
        "object": "event",
        "type": event_type,
        "data": {"object": {"id": object_id, "object": "checkout.session"}},
    })
    .to_string()
    .into_bytes()
}

/// `checkout.session.completed` body for `session_id`
pub fn completed_event(session_id: &str) -> Vec<u8> {
    event_payload(CHECKOUT_SESSION_COMPLETED, session_id)
}

/// Signature header for `payload`, signed now
pub fn signed(secret: &str, payload: &[u8]) -> String {
    SignatureVerifier::new(secret)
        .sign(payload, Utc::now().timestamp())
        .unwrap_or_default()
}
