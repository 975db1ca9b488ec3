//! Form Submission Notices
//!
//! Site forms (contact and per-package briefs) are posted to the server as
//! submission events. Each accepted submission produces an operator summary
//! and, when the visitor left an email address, an acknowledgment.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use storefront_core::{
    catalog::PackageId,
    error::Result,
    html::escape,
    mail::{Email, MailConfig, Mailer},
};

/// Submission event body: `{"payload": {...}}`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubmissionEnvelope {
    #[serde(default)]
    pub payload: Option<FormSubmission>,
}

/// One form submission
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub form_name: String,

    /// Raw field values keyed by input name
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Field values keyed by their human-readable labels
    #[serde(default)]
    pub human_fields: Map<String, Value>,

    #[serde(default)]
    pub site_url: Option<String>,

    /// Sequential submission number
    #[serde(default)]
    pub number: Option<u64>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl FormSubmission {
    /// Visitor email from the raw fields, when it looks like an address
    pub fn visitor_email(&self) -> Option<&str> {
        self.field("email").filter(|e| e.contains('@'))
    }

    /// Visitor name from the raw fields
    pub fn visitor_name(&self) -> Option<&str> {
        self.field("name")
    }

    fn field(&self, key: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Forms the notifier reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Brief(PackageId),
}

impl FormKind {
    pub const ALLOWED: [&'static str; 4] = ["contact", "brief-starter", "brief-growth", "brief-scale"];

    pub fn parse(form_name: &str) -> Option<Self> {
        match form_name {
            "contact" => Some(Self::Contact),
            "brief-starter" => Some(Self::Brief(PackageId::Starter)),
            "brief-growth" => Some(Self::Brief(PackageId::Growth)),
            "brief-scale" => Some(Self::Brief(PackageId::Scale)),
            _ => None,
        }
    }

    fn title(self) -> String {
        match self {
            Self::Contact => "New Contact submission".into(),
            Self::Brief(id) => format!("New {} Brief", id.as_str().to_uppercase()),
        }
    }

    fn subject(self, brand: &str) -> String {
        match self {
            Self::Contact => format!("{brand}: New contact form"),
            Self::Brief(id) => format!("{brand}: New {id} brief"),
        }
    }

    fn describe(self) -> String {
        match self {
            Self::Contact => "message".into(),
            Self::Brief(id) => format!("{} project brief", id.package().label),
        }
    }
}

/// Result of handling one submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormOutcome {
    /// Form is not on the allow-list
    Ignored { form_name: String },

    /// Operator summary sent; `acknowledged` when the visitor got a reply too
    Sent { kind: FormKind, acknowledged: bool },
}

/// Sends form submission notices
pub struct FormNotifier {
    mailer: Arc<dyn Mailer>,
    config: MailConfig,
}

impl FormNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: MailConfig) -> Self {
        Self { mailer, config }
    }

    /// Handle a submission. Both emails are attempted even if one fails; the
    /// first failure is returned afterwards.
    pub async fn notify(&self, submission: &FormSubmission) -> Result<FormOutcome> {
        let Some(kind) = FormKind::parse(&submission.form_name) else {
            tracing::debug!(form_name = %submission.form_name, "Ignoring form submission");
            return Ok(FormOutcome::Ignored {
                form_name: submission.form_name.clone(),
            });
        };

        let summary = self.operator_summary(kind, submission);
        let acknowledgment = submission
            .visitor_email()
            .map(|to| self.acknowledgment(kind, submission, to));

        let (summary_result, ack_result) = futures::future::join(
            self.mailer.send(&summary),
            async {
                match &acknowledgment {
                    Some(email) => self.mailer.send(email).await.map(|()| true),
                    None => Ok(false),
                }
            },
        )
        .await;

        if let Err(e) = &summary_result {
            tracing::error!(form_name = %submission.form_name, error = %e, "Operator form notice failed");
        }
        if let Err(e) = &ack_result {
            tracing::error!(form_name = %submission.form_name, error = %e, "Visitor acknowledgment failed");
        }

        summary_result?;
        let acknowledged = ack_result?;

        tracing::info!(
            form_name = %submission.form_name,
            number = ?submission.number,
            acknowledged,
            "Form submission notices sent"
        );

        Ok(FormOutcome::Sent { kind, acknowledged })
    }

    fn operator_summary(&self, kind: FormKind, submission: &FormSubmission) -> Email {
        let rows: String = submission
            .human_fields
            .iter()
            .map(|(label, value)| {
                format!(
                    r#"<tr><td style="padding:6px 10px;border:1px solid #eee;"><b>{}</b></td><td style="padding:6px 10px;border:1px solid #eee;">{}</td></tr>"#,
                    escape(label),
                    escape(&value_text(value)),
                )
            })
            .collect();
        let rows = if rows.is_empty() {
            r#"<tr><td style="padding:6px 10px;">(no readable fields)</td></tr>"#.to_string()
        } else {
            rows
        };

        let number = submission.number.map(|n| n.to_string()).unwrap_or_default();
        let html = format!(
            r#"<div style="font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif;font-size:14px;color:#0f172a;">
  <h2 style="margin:0 0 8px 0;">{title}</h2>
  <div style="margin:0 0 8px 0;color:#475569;">
    <div><b>Form:</b> {form}</div>
    <div><b>Submission #:</b> {number}</div>
    <div><b>Created:</b> {created}</div>
    <div><b>Site:</b> {site}</div>
  </div>
  <table style="border-collapse:collapse;border:1px solid #eee;">{rows}</table>
  <p style="color:#475569;margin-top:10px;">Attachments (if any) are stored with the submission.</p>
</div>"#,
            title = escape(&kind.title()),
            form = escape(&submission.form_name),
            number = escape(&number),
            created = escape(submission.created_at.as_deref().unwrap_or_default()),
            site = escape(submission.site_url.as_deref().unwrap_or_default()),
        );

        let email = Email::new(
            &self.config.from,
            &self.config.operator,
            kind.subject(&self.config.brand),
            html,
        )
        .with_cc(self.config.cc.as_deref());

        match submission.visitor_email() {
            Some(visitor) => email.with_reply_to(visitor),
            None => email,
        }
    }

    fn acknowledgment(&self, kind: FormKind, submission: &FormSubmission, to: &str) -> Email {
        let brand = &self.config.brand;
        let greeting = submission
            .visitor_name()
            .map_or_else(|| "Hi,".to_string(), |name| format!("Hi {},", escape(name)));
        let what = escape(&kind.describe());

        let template = AckTemplate::for_submission(submission.number);
        let (subject, body) = match template {
            AckTemplate::Prompt => (
                format!("{brand}: We received your {}", kind.describe()),
                format!(
                    "<p>Thanks for sending your {what}. A real person reads every submission and you will hear back within one business day.</p>"
                ),
            ),
            AckTemplate::NextSteps => (
                format!("{brand}: Thanks, we're on it"),
                format!(
                    "<p>Your {what} is in our queue.</p><p><b>What happens next</b><br/>• We review the details.<br/>• We reply with questions or a proposed kickoff date.</p>"
                ),
            ),
            AckTemplate::Reply => (
                format!("{brand}: Got it, talk soon"),
                format!(
                    "<p>We have your {what}. If you want to add links, assets or context, just reply to this email.</p>"
                ),
            ),
        };

        let html = format!(
            r#"<div style="font-family:system-ui,Segoe UI,Roboto,Arial,sans-serif;color:#0f172a;font-size:14px;line-height:1.6;">
  <p>{greeting}</p>
  {body}
  <p>{signature}</p>
</div>"#,
            signature = escape(brand),
        );

        Email::new(&self.config.from, to, subject, html)
    }
}

/// Acknowledgment copy variants, rotated by submission number
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AckTemplate {
    Prompt,
    NextSteps,
    Reply,
}

impl AckTemplate {
    const ROTATION: [Self; 3] = [Self::Prompt, Self::NextSteps, Self::Reply];

    fn for_submission(number: Option<u64>) -> Self {
        let slot = number.unwrap_or(0) % Self::ROTATION.len() as u64;
        Self::ROTATION[usize::try_from(slot).unwrap_or(0)]
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
