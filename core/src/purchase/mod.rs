// core/src/purchase/mod.rs

//! The payment-gated purchase workflow.
//!
//! A request is quoted against the ledger, the caller's signed payload is
//! checked by the facilitator, and only a verified payment is turned into
//! order rows and a wallet debit. Without a verified payment the caller gets
//! back the amount and the address to pay, and nothing is written.

mod context;
mod steps;

pub use context::{PurchaseCtxData, PurchaseState};
pub use steps::{
  APPLY_PURCHASE, NOTIFY_BUYER, QUOTE_TOTAL, RESOLVE_PRODUCTS, RESOLVE_WALLET, VALIDATE_REQUEST, VERIFY_PAYMENT,
};

use crate::error::{ErrorKind, PaygateError};
use crate::facilitator::PaymentFacilitator;
use crate::flow::{ContextData, Flow, FlowOutcome};
use crate::ledger::LedgerStore;
use crate::models::ProductId;
use crate::notify::NotificationDispatcher;
use crate::settings::PurchaseSettings;
use serde::Serialize;
use std::sync::Arc;
use steps::PurchaseDeps;
use tracing::{error, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
  Success,
  PaymentRequired,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyProductsResponse {
  pub status: PurchaseStatus,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub amount_required: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seller_address: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_kind: Option<ErrorKind>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub order_ids: Vec<Uuid>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub replayed: bool,
}

impl BuyProductsResponse {
  fn error(err: &PaygateError) -> Self {
    Self {
      status: PurchaseStatus::Error,
      message: err.public_message(),
      amount_required: None,
      seller_address: None,
      error_kind: Some(err.kind()),
      order_ids: Vec::new(),
      replayed: false,
    }
  }
}

/// Coordinates ledger, facilitator and notifications for one purchase call.
///
/// All collaborators are injected; the orchestrator holds no global state.
pub struct PurchaseOrchestrator {
  flow: Flow<PurchaseCtxData, PaygateError>,
  dispatcher: Arc<NotificationDispatcher>,
  settings: Arc<PurchaseSettings>,
}

impl PurchaseOrchestrator {
  pub fn new(
    ledger: Arc<dyn LedgerStore>,
    facilitator: Arc<dyn PaymentFacilitator>,
    dispatcher: Arc<NotificationDispatcher>,
    settings: PurchaseSettings,
  ) -> Self {
    let settings = Arc::new(settings);
    let flow = steps::build_purchase_flow(PurchaseDeps {
      ledger,
      facilitator,
      dispatcher: dispatcher.clone(),
      settings: settings.clone(),
    });
    Self {
      flow,
      dispatcher,
      settings,
    }
  }

  pub async fn buy_products(&self, product_ids: &[ProductId], signed_payload: Option<&str>) -> BuyProductsResponse {
    self.execute(product_ids, signed_payload).await.0
  }

  /// Like [`buy_products`](Self::buy_products) but also hands back the final
  /// flow context, including the trail of states visited.
  #[instrument(
    name = "purchase::buy_products",
    skip_all,
    fields(requested = product_ids.len(), has_payload = signed_payload.is_some())
  )]
  pub async fn execute(
    &self,
    product_ids: &[ProductId],
    signed_payload: Option<&str>,
  ) -> (BuyProductsResponse, PurchaseCtxData) {
    let ctx = ContextData::new(PurchaseCtxData::new(
      product_ids.to_vec(),
      signed_payload.map(str::to_string),
    ));

    let response = match self.flow.run(ctx.clone()).await {
      Ok(FlowOutcome::Completed) => {
        let mut guard = ctx.write();
        guard.transition(PurchaseState::Complete);
        let message = format!(
          "Bought {} product(s) for {}.",
          guard.orders.len(),
          self.dispatcher.format_amount(guard.total())
        );
        info!(orders = guard.orders.len(), total = guard.total(), "Purchase complete.");
        BuyProductsResponse {
          status: PurchaseStatus::Success,
          message,
          amount_required: None,
          seller_address: None,
          error_kind: None,
          order_ids: guard.orders.iter().map(|o| o.id).collect(),
          replayed: false,
        }
      }
      Ok(FlowOutcome::Stopped { step }) if step == VERIFY_PAYMENT => {
        let total = ctx.read().total();
        BuyProductsResponse {
          status: PurchaseStatus::PaymentRequired,
          message: format!(
            "Payment required: {} lamports. Provide a signed payment payload for the address {}. \
             If you do not have a wallet, try the Latinum MCP Wallet at https://latinum.ai",
            total, self.settings.seller_address
          ),
          amount_required: Some(total),
          seller_address: Some(self.settings.seller_address.clone()),
          error_kind: Some(ErrorKind::PaymentRequired),
          order_ids: Vec::new(),
          replayed: false,
        }
      }
      Ok(FlowOutcome::Stopped { step }) if step == APPLY_PURCHASE => {
        let mut guard = ctx.write();
        guard.transition(PurchaseState::Complete);
        BuyProductsResponse {
          status: PurchaseStatus::Success,
          message: format!(
            "This payment was already applied: {} product(s) were recorded earlier.",
            guard.orders.len()
          ),
          amount_required: None,
          seller_address: None,
          error_kind: None,
          order_ids: guard.orders.iter().map(|o| o.id).collect(),
          replayed: true,
        }
      }
      Ok(FlowOutcome::Stopped { step }) => {
        let err = PaygateError::Internal(format!("purchase flow stopped unexpectedly at '{}'", step));
        error!(error = %err, "Purchase failed.");
        ctx.write().transition(PurchaseState::Failed);
        BuyProductsResponse::error(&err)
      }
      Err(err) => {
        error!(error = %err, kind = ?err.kind(), "Purchase failed.");
        ctx.write().transition(PurchaseState::Failed);
        BuyProductsResponse::error(&err)
      }
    };

    (response, ctx.snapshot())
  }
}
