use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

pub struct ResendMailer {
    client: Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .context("email provider unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "email provider rejected message");
            return Err(anyhow!("email provider returned {status}: {body}"));
        }

        Ok(())
    }
}

pub fn invitation_email(from: &str, to: &str, app_base_url: &str) -> EmailMessage {
    let html = format!(
        concat!(
            "<div style=\"font-family: sans-serif; max-width: 560px; margin: 0 auto;\">",
            "<h1 style=\"color: #1f2937;\">Welcome to Kalanchiyam</h1>",
            "<p>You have been invited to keep your family's important documents in one safe place.</p>",
            "<p>Check your inbox for a separate sign-in link, or open ",
            "<a href=\"{base}\">{base}</a> and sign in with <strong>{to}</strong>.</p>",
            "<p style=\"color: #6b7280; font-size: 12px;\">If you were not expecting this invitation you can ignore this email.</p>",
            "</div>"
        ),
        base = app_base_url,
        to = to,
    );

    EmailMessage {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: "You're invited to Kalanchiyam".to_string(),
        html,
    }
}
