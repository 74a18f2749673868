// core/src/purchase/context.rs

use crate::models::{Order, PaymentProof, PaymentQuote, Product, ProductId, Wallet};
use crate::notify::NotificationReport;
use serde::Serialize;
use tracing::debug;

/// Where a purchase request stands.
///
/// `PaymentRequired`, `Complete` and `Failed` are terminal for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseState {
  QuoteRequested,
  PaymentRequired,
  PaymentVerified,
  OrderRecorded,
  LedgerDebited,
  Notified,
  Complete,
  Failed,
}

impl std::fmt::Display for PurchaseState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let label = match self {
      PurchaseState::QuoteRequested => "QUOTE_REQUESTED",
      PurchaseState::PaymentRequired => "PAYMENT_REQUIRED",
      PurchaseState::PaymentVerified => "PAYMENT_VERIFIED",
      PurchaseState::OrderRecorded => "ORDER_RECORDED",
      PurchaseState::LedgerDebited => "LEDGER_DEBITED",
      PurchaseState::Notified => "NOTIFIED",
      PurchaseState::Complete => "COMPLETE",
      PurchaseState::Failed => "FAILED",
    };
    f.write_str(label)
  }
}

/// State carried through one purchase run.
#[derive(Debug, Clone)]
pub struct PurchaseCtxData {
  pub product_ids: Vec<ProductId>,
  pub signed_payload: Option<String>,
  pub state: PurchaseState,
  /// Every state entered, in order, starting with `QuoteRequested`.
  pub trail: Vec<PurchaseState>,
  pub wallet: Option<Wallet>,
  pub products: Vec<Product>,
  pub quote: Option<PaymentQuote>,
  pub rejection_reason: Option<String>,
  pub proof: Option<PaymentProof>,
  pub orders: Vec<Order>,
  pub remaining_credit: Option<i64>,
  /// The payment proof had already been applied by an earlier call.
  pub replayed: bool,
  pub notification: Option<NotificationReport>,
}

impl PurchaseCtxData {
  pub fn new(product_ids: Vec<ProductId>, signed_payload: Option<String>) -> Self {
    Self {
      product_ids,
      signed_payload,
      state: PurchaseState::QuoteRequested,
      trail: vec![PurchaseState::QuoteRequested],
      wallet: None,
      products: Vec::new(),
      quote: None,
      rejection_reason: None,
      proof: None,
      orders: Vec::new(),
      remaining_credit: None,
      replayed: false,
      notification: None,
    }
  }

  pub fn transition(&mut self, next: PurchaseState) {
    debug!(from = %self.state, to = %next, "Purchase state transition.");
    self.state = next;
    self.trail.push(next);
  }

  pub fn total(&self) -> i64 {
    self.quote.as_ref().map_or(0, |q| q.amount)
  }
}
