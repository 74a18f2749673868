// server/src/services/mailer.rs

use async_trait::async_trait;
use paygate::error::{PaygateError, Result, UpstreamService};
use paygate::notify::{EmailMessage, NotificationSink};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Delivers mail through the Resend HTTP API.
pub struct ResendMailer {
  client: reqwest::Client,
  api_url: String,
  api_key: String,
  sender: String,
}

#[derive(Serialize)]
struct ResendEmail<'a> {
  from: &'a str,
  to: [&'a str; 1],
  subject: &'a str,
  text: &'a str,
}

impl ResendMailer {
  pub fn new(api_url: impl Into<String>, api_key: String, sender: String, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| PaygateError::Internal(format!("building mail client: {}", e)))?;
    Ok(Self {
      client,
      api_url: api_url.into(),
      api_key,
      sender,
    })
  }
}

#[async_trait]
impl NotificationSink for ResendMailer {
  #[instrument(name = "mail::send", skip_all, fields(subject = %message.subject), err(Display))]
  async fn send(&self, message: &EmailMessage) -> Result<()> {
    let body = ResendEmail {
      from: &self.sender,
      to: [&message.to],
      subject: &message.subject,
      text: &message.body,
    };
    let response = self
      .client
      .post(&self.api_url)
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| PaygateError::upstream(UpstreamService::Mail, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      return Err(PaygateError::upstream(UpstreamService::Mail, format!("HTTP {}: {}", status, text)));
    }
    info!("Mail accepted by Resend.");
    Ok(())
  }
}

/// Logs mail instead of sending it. Used when no Resend key is configured.
pub struct LogMailer {
  sender: String,
}

impl LogMailer {
  pub fn new(sender: String) -> Self {
    Self { sender }
  }
}

#[async_trait]
impl NotificationSink for LogMailer {
  async fn send(&self, message: &EmailMessage) -> Result<()> {
    let body_preview = message.body.chars().take(50).collect::<String>();
    info!(
      from = %self.sender,
      to = %message.to,
      subject = %message.subject,
      %body_preview,
      "Mail delivery disabled; logging message instead."
    );
    Ok(())
  }
}
