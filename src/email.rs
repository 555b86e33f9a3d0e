use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::models::{Memorial, PaymentTransaction, Tribute};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("request to email provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// EmailService
///
/// Contract for the transactional email provider.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub type EmailState = Arc<dyn EmailService>;

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// ResendEmailClient
///
/// Sends through the Resend HTTP API (`POST /emails`).
#[derive(Clone)]
pub struct ResendEmailClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailClient {
    pub fn new(base_url: &str, api_key: &str, from: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailService for ResendEmailClient {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let payload = ResendPayload {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Minimal HTML escaping for user-supplied text embedded in email bodies.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Notification to a memorial owner that a tribute is waiting for approval.
pub fn new_tribute_email(
    to: &str,
    memorial: &Memorial,
    tribute: &Tribute,
    site_url: &str,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("New tribute for {}", memorial.full_name),
        html: format!(
            "<p>{} left a tribute on the memorial of {}:</p><blockquote>{}</blockquote>\
             <p><a href=\"{}/dashboard/memorials/{}\">Review it</a> to make it visible.</p>",
            escape_html(&tribute.author_name),
            escape_html(&memorial.full_name),
            escape_html(&tribute.message),
            site_url.trim_end_matches('/'),
            memorial.id,
        ),
    }
}

/// Receipt sent once a payment settles.
pub fn payment_receipt_email(to: &str, txn: &PaymentTransaction) -> EmailMessage {
    let major = txn.amount_kobo / 100;
    let minor = txn.amount_kobo % 100;
    EmailMessage {
        to: to.to_string(),
        subject: "Your SoulBridge payment receipt".to_string(),
        html: format!(
            "<p>Thank you. We received {} {}.{:02} for the <strong>{}</strong> plan.</p>\
             <p>Reference: {}</p>",
            escape_html(&txn.currency),
            major,
            minor,
            escape_html(&txn.plan_code),
            escape_html(&txn.reference),
        ),
    }
}

/// MockEmailService
///
/// Captures outgoing messages instead of sending them.
#[derive(Default)]
pub struct MockEmailService {
    pub should_fail: bool,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.should_fail {
            return Err(EmailError::Rejected {
                status: 500,
                body: "simulated failure".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}
