//! Order Notifications
//!
//! A completed session produces two emails: a confirmation for the customer
//! (only when Stripe gave us an address) and an internal summary for the
//! operator. Both are rendered from an [`OrderSummary`].

use std::sync::Arc;

use serde::Serialize;
use storefront_core::{
    Timeline,
    html::{escape, mailbox_address},
    mail::{Email, MailConfig, Mailer},
    money::{currency_code, format_amount},
};

use crate::error::{PaymentError, Result};
use crate::session::SessionSnapshot;
use crate::transaction::TransactionReference;

/// Everything the order emails need, derived from an expanded session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSummary {
    pub session_id: String,
    pub timeline: Timeline,
    pub rush: bool,
    /// e.g. `"900.00 USD"`, or just `"USD"` without an amount
    pub amount: String,
    pub currency: String,
    pub reference: TransactionReference,
    pub customer_email: Option<String>,
}

impl OrderSummary {
    pub fn from_session(session: &SessionSnapshot) -> Self {
        let currency = session.currency.as_deref();
        Self {
            session_id: session.id.clone(),
            timeline: Timeline::from_metadata(session.package_metadata()),
            rush: session.rush_requested(),
            amount: format_amount(session.effective_amount(), currency),
            currency: currency_code(currency),
            reference: TransactionReference::resolve(session),
            customer_email: session.customer_email().map(str::to_string),
        }
    }
}

/// Which order emails went out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub customer_notified: bool,
    pub operator_notified: bool,
}

/// Sends order confirmation emails
pub struct OrderNotifier {
    mailer: Arc<dyn Mailer>,
    config: MailConfig,
}

impl OrderNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: MailConfig) -> Self {
        Self { mailer, config }
    }

    pub const fn config(&self) -> &MailConfig {
        &self.config
    }

    /// Send both emails concurrently. Neither send short-circuits the other;
    /// if either fails the whole dispatch fails.
    pub async fn notify(&self, summary: &OrderSummary) -> Result<NotificationReport> {
        let customer = summary
            .customer_email
            .as_deref()
            .map(|to| self.customer_email(summary, to));
        let operator = self.operator_email(summary);

        let (customer_result, operator_result) = futures::future::join(
            async {
                match &customer {
                    Some(email) => self.mailer.send(email).await.map(|()| true),
                    None => Ok(false),
                }
            },
            self.mailer.send(&operator),
        )
        .await;

        let mut failures = Vec::new();
        if let Err(e) = &customer_result {
            tracing::error!(session_id = %summary.session_id, error = %e, "Customer confirmation failed");
            failures.push(format!("customer: {e}"));
        }
        if let Err(e) = &operator_result {
            tracing::error!(session_id = %summary.session_id, error = %e, "Operator notification failed");
            failures.push(format!("operator: {e}"));
        }
        if !failures.is_empty() {
            return Err(PaymentError::Notification(failures.join("; ")));
        }

        let report = NotificationReport {
            customer_notified: customer_result.unwrap_or(false),
            operator_notified: true,
        };
        tracing::info!(
            session_id = %summary.session_id,
            customer_notified = report.customer_notified,
            "Order notifications sent"
        );
        Ok(report)
    }

    fn customer_email(&self, summary: &OrderSummary, to: &str) -> Email {
        let brand = &self.config.brand;
        let timeline = &summary.timeline;
        let contact = escape(mailbox_address(&self.config.from));
        let rush_text = if summary.rush { "rush selected" } else { "standard timeline" };

        let subject = format!("{brand}: Payment received — your {} is locked in", timeline.label);
        let html = format!(
            r#"<div style="font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif;color:#0f172a;font-size:14px;line-height:1.6;">
  <p>Hi,</p>
  <p>Thanks, your payment for <b>{label}</b> ({amount}) is confirmed.</p>
  <p><b>{id_label}:</b> <b>{id_value}</b></p>
  <p><b>What happens next</b><br/>
  • We finalize your slot and share a brief kickoff note.<br/>
  • Timeline: <b>{days} days</b> ({rush_text}; rush timeline: <b>{rush_days} days</b>).<br/>
  • If you need to add assets or context, just reply to this email.</p>
  <p>We're excited to get started.</p>
  <p>{brand}<br/><a href="mailto:{contact}">{contact}</a></p>
</div>"#,
            label = escape(&timeline.label),
            amount = escape(&summary.amount),
            id_label = escape(summary.reference.label()),
            id_value = escape(&summary.reference.value),
            days = escape(&timeline.days_display()),
            rush_days = escape(&timeline.rush_days_display()),
            brand = escape(brand),
        );

        Email::new(&self.config.from, to, subject, html)
    }

    fn operator_email(&self, summary: &OrderSummary) -> Email {
        let timeline = &summary.timeline;
        let reference = &summary.reference;

        let subject = format!(
            "{}: Payment received — {} ({})",
            self.config.brand, timeline.label, summary.amount
        );
        let html = format!(
            r#"<div style="font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif;color:#0f172a;font-size:14px;line-height:1.6;">
  <h2 style="margin:0 0 8px 0;">Payment received</h2>
  <p><b>Package:</b> {label} &nbsp; <b>Rush:</b> {rush}</p>
  <p><b>Total:</b> {amount} &nbsp; <b>Currency:</b> {currency}</p>
  <p><b>Payment Intent:</b> {payment_intent}<br/>
     <b>Charge:</b> {charge}<br/>
     <b>{id_label}:</b> {id_value}</p>
  <p><b>Customer email (Stripe):</b> {customer}</p>
  <p><b>Timelines:</b> {days} days (rush {rush_days} days)</p>
  <p style="color:#475569;">Source: checkout.session.completed</p>
</div>"#,
            label = escape(&timeline.label),
            rush = if summary.rush { "Yes" } else { "No" },
            amount = escape(&summary.amount),
            currency = escape(&summary.currency),
            payment_intent = escape(reference.payment_intent_id.as_deref().unwrap_or("—")),
            charge = escape(reference.charge_id.as_deref().unwrap_or("—")),
            id_label = escape(reference.label()),
            id_value = escape(&reference.value),
            customer = escape(summary.customer_email.as_deref().unwrap_or("—")),
            days = escape(&timeline.days_display()),
            rush_days = escape(&timeline.rush_days_display()),
        );

        Email::new(&self.config.from, &self.config.operator, subject, html).with_cc(self.config.cc.as_deref())
    }
}
