// core/src/models/quote.rs

use serde::{Deserialize, Serialize};

/// What the seller expects to be paid, plus whatever proof the caller sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQuote {
  pub recipient: String,
  pub amount: i64,
  pub signed_payload: Option<String>,
}

impl PaymentQuote {
  /// The payload, if it is present and not blank.
  pub fn payload(&self) -> Option<&str> {
    self.signed_payload.as_deref().map(str::trim).filter(|p| !p.is_empty())
  }
}

/// Unique identifier of a settled payment (the facilitator's transaction id).
/// Used to refuse applying the same payment twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentProof(String);

impl PaymentProof {
  pub fn new(id: impl Into<String>) -> Self {
    PaymentProof(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for PaymentProof {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    // Signed payloads can stand in for a txid; keep log lines short.
    let shown: String = self.0.chars().take(16).collect();
    if self.0.chars().count() > 16 {
      write!(f, "{}…", shown)
    } else {
      f.write_str(&shown)
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentVerdict {
  Approved { proof: PaymentProof },
  Rejected { reason: String },
}

impl PaymentVerdict {
  pub fn rejected(reason: impl Into<String>) -> Self {
    PaymentVerdict::Rejected { reason: reason.into() }
  }
}
