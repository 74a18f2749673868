// core/src/facilitator.rs

//! Verification of signed payment payloads by the external facilitator.
//!
//! Every outcome other than an explicit `allowed: true` is a rejection, so the
//! purchase flow fails closed. Transport failures are errors, not rejections:
//! a caller must be able to tell "the facilitator said no" apart from "the
//! facilitator could not be reached". There is no retry, because a retried
//! submission may or may not have captured the payment.

use crate::error::{PaygateError, Result, UpstreamService};
use crate::models::{PaymentProof, PaymentQuote, PaymentVerdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

#[async_trait]
pub trait PaymentFacilitator: Send + Sync {
  async fn verify(&self, quote: &PaymentQuote) -> Result<PaymentVerdict>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
  signed_transaction_b64: &'a str,
  expected_recipient: &'a str,
  expected_amount_lamports: i64,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
  allowed: Option<bool>,
  txid: Option<String>,
  error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpFacilitatorClient {
  client: reqwest::Client,
  verify_url: String,
}

impl HttpFacilitatorClient {
  pub fn new(verify_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| PaygateError::Internal(format!("building facilitator client: {}", e)))?;
    Ok(Self {
      client,
      verify_url: verify_url.into(),
    })
  }
}

#[async_trait]
impl PaymentFacilitator for HttpFacilitatorClient {
  #[instrument(
    name = "facilitator::verify",
    skip(self, quote),
    fields(recipient = %quote.recipient, amount = quote.amount),
    err(Display)
  )]
  async fn verify(&self, quote: &PaymentQuote) -> Result<PaymentVerdict> {
    let Some(payload) = quote.payload() else {
      info!("No signed payload supplied; payment not verified.");
      return Ok(PaymentVerdict::rejected("no signed payment payload supplied"));
    };

    let body = VerifyRequest {
      signed_transaction_b64: payload,
      expected_recipient: &quote.recipient,
      expected_amount_lamports: quote.amount,
    };
    info!(payload_len = payload.len(), "Submitting payment payload for verification.");

    let response = self
      .client
      .post(&self.verify_url)
      .json(&body)
      .send()
      .await
      .map_err(|e| PaygateError::upstream(UpstreamService::Facilitator, e.to_string()))?;

    // The body of a non-success answer is never read.
    let status = response.status();
    if !status.is_success() {
      warn!(%status, "Facilitator answered with a non-success status.");
      return Ok(PaymentVerdict::rejected(format!("facilitator answered HTTP {}", status.as_u16())));
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| PaygateError::upstream(UpstreamService::Facilitator, e.to_string()))?;

    let parsed: VerifyResponse = match serde_json::from_slice(&bytes) {
      Ok(parsed) => parsed,
      Err(e) => {
        warn!(error = %e, "Facilitator response could not be decoded.");
        return Ok(PaymentVerdict::rejected("malformed facilitator response"));
      }
    };

    match parsed.allowed {
      Some(true) => {
        let proof = parsed
          .txid
          .filter(|t| !t.trim().is_empty())
          .map(PaymentProof::new)
          .unwrap_or_else(|| PaymentProof::new(payload));
        info!(%proof, "Payment verified.");
        Ok(PaymentVerdict::Approved { proof })
      }
      Some(false) => {
        let reason = parsed.error.unwrap_or_else(|| "payment not allowed".to_string());
        info!(%reason, "Facilitator rejected the payment.");
        Ok(PaymentVerdict::Rejected { reason })
      }
      None => {
        warn!("Facilitator response carried no 'allowed' flag.");
        Ok(PaymentVerdict::rejected("malformed facilitator response"))
      }
    }
  }
}
