//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};

use storefront_mail::{FormKind, FormOutcome, SubmissionEnvelope};
use storefront_payments::{
    CheckoutRequest, CreatedSession, PaymentError, SIGNATURE_HEADER, SessionStatus, WebhookOutcome, decode_body,
    session_status as load_session_status,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub webhook_configured: bool,
    pub mail_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Checkout session handed to the payment page
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CheckoutResponse {
    Embedded {
        #[serde(rename = "clientSecret")]
        client_secret: String,
    },
    Hosted {
        url: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct SessionStatusQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn payments_disabled() -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Payments not configured", "PAYMENTS_DISABLED")
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.payments.is_some(),
        webhook_configured: state.webhook_verifier.is_some(),
        mail_configured: state.mail.is_some(),
    })
}

/// Create Stripe checkout session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, ApiError> {
    // An empty body is treated as `{}` and fails on the package
    let request: CheckoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CheckoutRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tracing::debug!(error = %e, "Unreadable checkout request");
            api_error(StatusCode::BAD_REQUEST, "Invalid request body", "INVALID_BODY")
        })?
    };

    let service = state.checkout().ok_or_else(payments_disabled)?;

    let session = service.create(&request).await.map_err(|e| match e {
        PaymentError::InvalidPackage(ref slug) => {
            tracing::debug!(slug = %slug, "Checkout for unknown package");
            api_error(StatusCode::BAD_REQUEST, e.user_message(), "INVALID_PACKAGE")
        }
        other => {
            tracing::error!(slug = request.slug(), rush = request.is_rush(), error = %other, "Checkout error");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, other.user_message(), "CHECKOUT_ERROR")
        }
    })?;

    Ok(Json(match session {
        CreatedSession::Embedded { client_secret, .. } => CheckoutResponse::Embedded { client_secret },
        CreatedSession::Hosted { url, .. } => CheckoutResponse::Hosted { url },
    }))
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let Some(handler) = state.webhook() else {
        tracing::error!("Webhook received without STRIPE_WEBHOOK_SECRET or STRIPE_SECRET_KEY");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Webhook misconfigured");
    };

    let base64_encoded = headers
        .get("content-transfer-encoding")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"));

    let payload = match decode_body(&body, base64_encoded) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable webhook body");
            return (StatusCode::BAD_REQUEST, "Webhook Error: invalid payload");
        }
    };

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    match handler.handle(&payload, signature).await {
        Ok(WebhookOutcome::Ignored { .. }) => (StatusCode::OK, "Ignored"),
        Ok(WebhookOutcome::Processed { .. }) => (StatusCode::OK, "ok"),
        Err(PaymentError::WebhookSignature(_)) => (StatusCode::BAD_REQUEST, "Webhook Error: invalid signature"),
        Err(PaymentError::WebhookParse(_)) => (StatusCode::BAD_REQUEST, "Webhook Error: invalid payload"),
        Err(PaymentError::MailConfig(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "Email env missing"),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Webhook handler error"),
    }
}

/// Session status for the thank-you page
pub async fn session_status(
    State(state): State<AppState>,
    Query(query): Query<SessionStatusQuery>,
) -> Result<Json<SessionStatus>, ApiError> {
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing session_id", "MISSING_SESSION_ID"))?;

    let provider = state.payments.as_ref().ok_or_else(payments_disabled)?;

    // Malformed ids never reach Stripe but answer like any failed lookup
    load_session_status(&**provider, Some(session_id))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(session_id, error = %e, "Failed to load session");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load session", "SESSION_LOOKUP_FAILED")
        })
}

/// Form submission event
pub async fn submission_created(State(state): State<AppState>, body: Bytes) -> (StatusCode, &'static str) {
    let submission = match serde_json::from_slice::<SubmissionEnvelope>(&body) {
        Ok(SubmissionEnvelope { payload: Some(submission) }) => submission,
        Ok(SubmissionEnvelope { payload: None }) => return (StatusCode::BAD_REQUEST, "No payload"),
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable submission event");
            return (StatusCode::BAD_REQUEST, "Invalid payload");
        }
    };

    if FormKind::parse(&submission.form_name).is_none() {
        tracing::debug!(form_name = %submission.form_name, "Ignoring form");
        return (StatusCode::OK, "Ignored form");
    }

    let Some(notifier) = state.form_notifier() else {
        tracing::error!(form_name = %submission.form_name, "Form submitted but email is not configured");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Email env vars not configured");
    };

    match notifier.notify(&submission).await {
        Ok(FormOutcome::Sent { .. }) => (StatusCode::OK, "OK"),
        Ok(FormOutcome::Ignored { .. }) => (StatusCode::OK, "Ignored form"),
        Err(e) => {
            tracing::error!(form_name = %submission.form_name, error = %e, "Form notification failed");
            (StatusCode::BAD_GATEWAY, "Failed to send email")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Method, Request, Response, StatusCode},
    };
    use base64::Engine;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use storefront_core::{MailConfig, testing::RecordingMailer};
    use storefront_payments::{
        PriceTable, SessionSnapshot, SignatureVerifier,
        testing::{FakeProvider, completed_event, event_payload, signed},
    };
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::state::{AppState, MailContext};

    const SECRET: &str = "whsec_e2e";

    struct Harness {
        provider: Arc<FakeProvider>,
        mailer: Arc<RecordingMailer>,
        app: Router,
    }

    fn mail_config() -> MailConfig {
        MailConfig {
            api_key: "re_test".into(),
            from: "CITEKS <contact@citeks.net>".into(),
            operator: "ops@citeks.net".into(),
            cc: None,
            brand: "CITEKS".into(),
        }
    }

    fn harness_with(provider: FakeProvider, mailer: RecordingMailer, mail: bool) -> Harness {
        let provider = Arc::new(provider);
        let mailer = Arc::new(mailer);
        let state = AppState {
            payments: Some(provider.clone()),
            prices: Arc::new(PriceTable::from_lookup(|key| Some(format!("price_{}", key.to_lowercase())))),
            site_origin: "https://example.com".into(),
            webhook_verifier: Some(SignatureVerifier::new(SECRET)),
            mail: mail.then(|| MailContext {
                mailer: mailer.clone(),
                config: mail_config(),
            }),
        };
        Harness {
            provider,
            mailer,
            app: router(state, "does-not-exist"),
        }
    }

    fn harness(provider: FakeProvider) -> Harness {
        harness_with(provider, RecordingMailer::new(), true)
    }

    fn paid_session(id: &str, package: &str, rush: bool) -> SessionSnapshot {
        serde_json::from_value(json!({
            "id": id,
            "status": "complete",
            "payment_status": "paid",
            "amount_total": 90000,
            "currency": "usd",
            "metadata": {"package": package, "rush": rush.to_string()},
            "customer_details": {"email": "buyer@example.com"},
            "payment_intent": {"id": "pi_e2e", "status": "succeeded", "latest_charge": {"id": "ch_e2e"}},
        }))
        .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn webhook(payload: Vec<u8>, signature: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/stripe-webhook")
            .header("Stripe-Signature", signature)
            .body(Body::from(payload))
            .unwrap()
    }

    #[tokio::test]
    async fn test_scenario_a_checkout_then_completed_webhook() {
        let h = harness(FakeProvider::new().with_session(paid_session("cs_test_fake_1", "starter", false)));

        let response = send(
            &h.app,
            post_json(
                "/api/checkout-session",
                &json!({"slug": "starter", "rush": false, "origin": "https://example.com"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["clientSecret"].as_str().is_some_and(|s| !s.is_empty()));

        let created = h.provider.created();
        assert_eq!(created[0].metadata.get("package").map(String::as_str), Some("starter"));
        assert_eq!(created[0].metadata.get("rush").map(String::as_str), Some("false"));

        let payload = completed_event("cs_test_fake_1");
        let header = signed(SECRET, &payload);
        let response = send(&h.app, webhook(payload, &header)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");

        let operator = h.mailer.sent_to("ops@citeks.net");
        assert_eq!(operator.len(), 1);
        let html = &operator[0].html;
        assert!(html.contains("Starter"));
        assert!(html.contains("<b>Rush:</b> No"));
        assert!(html.contains("900.00 USD"));
        assert_eq!(h.mailer.sent_to("buyer@example.com").len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_b_invalid_signature_sends_nothing() {
        let h = harness(FakeProvider::new().with_session(paid_session("cs_test_b", "growth", true)));

        let payload = completed_event("cs_test_b");
        let header = signed("whsec_forged", &payload);
        let response = send(&h.app, webhook(payload, &header)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("Webhook Error"));
        assert!(h.mailer.sent().is_empty());
        assert_eq!(h.provider.retrieved(), 0);
    }

    #[tokio::test]
    async fn test_scenario_c_status_derives_line_items_total() {
        let session: SessionSnapshot = serde_json::from_value(json!({
            "id": "cs_test_c",
            "status": "complete",
            "payment_status": "paid",
            "currency": "usd",
            "line_items": {"data": [
                {"quantity": 2, "price": {"unit_amount": 5000}},
                {"quantity": 1, "price": {"unit_amount": 3000}},
            ]},
        }))
        .unwrap();
        let h = harness(FakeProvider::new().with_session(session));

        let request = Request::get("/api/session-status?session_id=cs_test_c")
            .body(Body::empty())
            .unwrap();
        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["line_items_total"], 13_000);
        assert_eq!(body["amount_total"], Value::Null);
        assert_eq!(body["id"], "cs_test_c");
    }

    #[tokio::test]
    async fn test_invalid_package_never_calls_provider() {
        let h = harness(FakeProvider::new());

        let response = send(&h.app, post_json("/api/checkout-session", &json!({"slug": "platinum"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid package");

        let response = send(
            &h.app,
            Request::post("/api/checkout-session").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(h.provider.created().is_empty());
    }

    #[tokio::test]
    async fn test_hosted_checkout_returns_url() {
        let h = harness(FakeProvider::new());
        let response = send(
            &h.app,
            post_json("/.netlify/functions/create-checkout-session", &json!({"slug": "scale", "rush": true, "uiMode": "hosted"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["url"].as_str().is_some_and(|u| u.starts_with("https://")));
        assert!(body.get("clientSecret").is_none());
    }

    #[tokio::test]
    async fn test_checkout_requires_post() {
        let h = harness(FakeProvider::new());
        let response = send(&h.app, Request::get("/api/checkout-session").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = send(&h.app, Request::get("/api/stripe-webhook").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_provider_failure_is_generic_500() {
        let h = harness(FakeProvider::new().failing());
        let response = send(&h.app, post_json("/api/checkout-session", &json!({"slug": "growth"}))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap_or_default().contains("upstream"));

        let request = Request::get("/api/session-status?session_id=cs_test_x")
            .body(Body::empty())
            .unwrap();
        let response = send(&h.app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Failed to load session");
    }

    #[tokio::test]
    async fn test_missing_session_id() {
        let h = harness(FakeProvider::new());
        for uri in ["/api/session-status", "/api/session-status?session_id="] {
            let response = send(&h.app, Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "Missing session_id");
        }
        assert_eq!(h.provider.retrieved(), 0);
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_failed_lookup() {
        let h = harness(FakeProvider::new());
        for uri in ["/api/session-status?session_id=pi_123", "/api/session-status?session_id=cs_test%2F..%2Fcustomers"] {
            let response = send(&h.app, Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_json(response).await["error"], "Failed to load session");
        }
        assert_eq!(h.provider.retrieved(), 0);
    }

    #[tokio::test]
    async fn test_completed_event_without_session_id_is_500() {
        let h = harness(FakeProvider::new());
        let payload = json!({
            "id": "evt_no_object",
            "type": "checkout.session.completed",
            "data": {"object": {"object": "checkout.session"}},
        })
        .to_string()
        .into_bytes();
        let header = signed(SECRET, &payload);

        let response = send(&h.app, webhook(payload, &header)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Webhook handler error");
        assert_eq!(h.provider.retrieved(), 0);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_null_fields_in_checkout_body() {
        let h = harness(FakeProvider::new());

        let response = send(&h.app, post_json("/api/checkout-session", &json!({"slug": null, "rush": null}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid package");

        let response = send(&h.app, post_json("/api/checkout-session", &json!({"slug": "starter", "rush": null}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.provider.created()[0].metadata.get("rush").map(String::as_str), Some("false"));
    }

    #[tokio::test]
    async fn test_other_event_types_acknowledged() {
        let h = harness(FakeProvider::new());
        let payload = event_payload("charge.refunded", "ch_1");
        let header = signed(SECRET, &payload);

        let response = send(&h.app, webhook(payload, &header)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Ignored");
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_redelivered_event_sends_duplicates() {
        // Accepted tradeoff: nothing records delivered events.
        let h = harness(FakeProvider::new().with_session(paid_session("cs_test_r", "growth", true)));
        let payload = completed_event("cs_test_r");
        let header = signed(SECRET, &payload);

        for _ in 0..2 {
            let response = send(&h.app, webhook(payload.clone(), &header)).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(h.mailer.sent_to("buyer@example.com").len(), 2);
        assert_eq!(h.mailer.sent_to("ops@citeks.net").len(), 2);
    }

    #[tokio::test]
    async fn test_base64_transport_body_verified_on_decoded_bytes() {
        let h = harness(FakeProvider::new().with_session(paid_session("cs_test_64", "scale", false)));
        let payload = completed_event("cs_test_64");
        let header = signed(SECRET, &payload);
        let encoded = base64::engine::general_purpose::STANDARD.encode(&payload);

        let request = Request::post("/.netlify/functions/stripe-webhook")
            .header("stripe-signature", header)
            .header("content-transfer-encoding", "base64")
            .body(Body::from(encoded))
            .unwrap();
        let response = send(&h.app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_webhook_without_mail_config_is_500() {
        let h = harness_with(
            FakeProvider::new().with_session(paid_session("cs_test_m", "starter", false)),
            RecordingMailer::new(),
            false,
        );
        let payload = completed_event("cs_test_m");
        let header = signed(SECRET, &payload);

        let response = send(&h.app, webhook(payload, &header)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Email env missing");
        assert_eq!(h.provider.retrieved(), 0);
    }

    #[tokio::test]
    async fn test_email_failure_triggers_redelivery() {
        let h = harness_with(
            FakeProvider::new().with_session(paid_session("cs_test_f", "starter", false)),
            RecordingMailer::failing_for("ops@citeks.net"),
            true,
        );
        let payload = completed_event("cs_test_f");
        let header = signed(SECRET, &payload);

        let response = send(&h.app, webhook(payload, &header)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Webhook handler error");
        assert_eq!(h.mailer.sent_to("buyer@example.com").len(), 1);
    }

    #[tokio::test]
    async fn test_form_submission_notifies() {
        let h = harness(FakeProvider::new());
        let event = json!({"payload": {
            "form_name": "brief-growth",
            "data": {"name": "Ada", "email": "ada@example.com"},
            "human_fields": {"Name": "Ada", "Email": "ada@example.com"},
            "number": 4,
        }});

        let response = send(&h.app, post_json("/api/submission-created", &event)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
        assert_eq!(h.mailer.sent_to("ops@citeks.net").len(), 1);
        assert_eq!(h.mailer.sent_to("ada@example.com").len(), 1);
    }

    #[tokio::test]
    async fn test_form_edge_cases() {
        let h = harness(FakeProvider::new());

        let response = send(&h.app, post_json("/api/submission-created", &json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "No payload");

        let ignored = json!({"payload": {"form_name": "newsletter", "data": {}}});
        let response = send(&h.app, post_json("/.netlify/functions/submission-created", &ignored)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Ignored form");
        assert!(h.mailer.sent().is_empty());

        let failing = harness_with(FakeProvider::new(), RecordingMailer::failing_for("ops@citeks.net"), true);
        let contact = json!({"payload": {"form_name": "contact", "data": {"email": "v@example.com"}}});
        let response = send(&failing.app, post_json("/api/submission-created", &contact)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health_reports_integrations() {
        let h = harness_with(FakeProvider::new(), RecordingMailer::new(), false);
        let response = send(&h.app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["stripe_configured"], true);
        assert_eq!(body["mail_configured"], false);
    }
}
