// core/src/purchase/steps.rs

//! The purchase flow. One step per transition of the purchase state machine.

use super::context::{PurchaseCtxData, PurchaseState};
use crate::error::PaygateError;
use crate::facilitator::PaymentFacilitator;
use crate::flow::{ContextData, Flow, FlowControl};
use crate::ledger::{ApplyOutcome, LedgerStore, PurchaseApplication};
use crate::models::product::total_price;
use crate::models::{PaymentQuote, PaymentVerdict};
use crate::notify::NotificationDispatcher;
use crate::settings::PurchaseSettings;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const VALIDATE_REQUEST: &str = "validate_request";
pub const RESOLVE_WALLET: &str = "resolve_wallet";
pub const RESOLVE_PRODUCTS: &str = "resolve_products";
pub const QUOTE_TOTAL: &str = "quote_total";
pub const VERIFY_PAYMENT: &str = "verify_payment";
pub const APPLY_PURCHASE: &str = "apply_purchase";
pub const NOTIFY_BUYER: &str = "notify_buyer";

#[derive(Clone)]
pub(crate) struct PurchaseDeps {
  pub ledger: Arc<dyn LedgerStore>,
  pub facilitator: Arc<dyn PaymentFacilitator>,
  pub dispatcher: Arc<NotificationDispatcher>,
  pub settings: Arc<PurchaseSettings>,
}

pub(crate) fn build_purchase_flow(deps: PurchaseDeps) -> Flow<PurchaseCtxData, PaygateError> {
  let mut flow = Flow::<PurchaseCtxData, PaygateError>::new(
    "purchase",
    &[
      (VALIDATE_REQUEST, false, None),
      (RESOLVE_WALLET, false, None),
      (RESOLVE_PRODUCTS, false, None),
      (QUOTE_TOTAL, false, None),
      (VERIFY_PAYMENT, false, None),
      (APPLY_PURCHASE, false, None),
      (NOTIFY_BUYER, true, None),
    ],
  );

  flow.on_step(VALIDATE_REQUEST, |ctx: ContextData<PurchaseCtxData>| async move {
    let mut guard = ctx.write();
    if guard.product_ids.is_empty() {
      return Err(PaygateError::Validation("expected at least one product id".to_string()));
    }
    // A repeated id buys the product once.
    let mut seen = HashSet::new();
    guard.product_ids.retain(|id| seen.insert(*id));
    Ok(FlowControl::Continue)
  });

  let d = deps.clone();
  flow.on_step(RESOLVE_WALLET, move |ctx: ContextData<PurchaseCtxData>| {
    let deps = d.clone();
    async move {
      let wallet_id = deps.settings.wallet_id;
      let wallet = deps
        .ledger
        .wallet(wallet_id)
        .await?
        .ok_or_else(|| PaygateError::NotFound(format!("wallet {}", wallet_id)))?;
      ctx.write().wallet = Some(wallet);
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  let d = deps.clone();
  flow.on_step(RESOLVE_PRODUCTS, move |ctx: ContextData<PurchaseCtxData>| {
    let deps = d.clone();
    async move {
      let requested = ctx.read().product_ids.clone();
      let products = deps.ledger.products_by_ids(&requested).await?;
      if products.is_empty() {
        return Err(PaygateError::NotFound("no products match the requested ids".to_string()));
      }
      if products.len() < requested.len() {
        let found: HashSet<_> = products.iter().map(|p| p.id).collect();
        let missing: Vec<_> = requested.iter().filter(|id| !found.contains(*id)).collect();
        warn!(?missing, "Some requested products do not exist; buying the rest.");
      }
      ctx.write().products = products;
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  let d = deps.clone();
  flow.on_step(QUOTE_TOTAL, move |ctx: ContextData<PurchaseCtxData>| {
    let deps = d.clone();
    async move {
      let mut guard = ctx.write();
      if let Some(bad) = guard.products.iter().find(|p| p.price < 0) {
        return Err(PaygateError::Validation(format!("product {} has a negative price", bad.id)));
      }
      let total = total_price(&guard.products)
        .ok_or_else(|| PaygateError::Validation("order total is too large".to_string()))?;
      let payload = guard.signed_payload.clone();
      guard.quote = Some(PaymentQuote {
        recipient: deps.settings.seller_address.clone(),
        amount: total,
        signed_payload: payload,
      });
      info!(total, items = guard.products.len(), "Quoted purchase total.");
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  let d = deps.clone();
  flow.on_step(VERIFY_PAYMENT, move |ctx: ContextData<PurchaseCtxData>| {
    let deps = d.clone();
    async move {
      let quote = ctx
        .read()
        .quote
        .clone()
        .ok_or_else(|| PaygateError::Internal("payment verification ran before quoting".to_string()))?;

      match deps.facilitator.verify(&quote).await? {
        PaymentVerdict::Approved { proof } => {
          let mut guard = ctx.write();
          guard.proof = Some(proof);
          guard.transition(PurchaseState::PaymentVerified);
          Ok(FlowControl::Continue)
        }
        PaymentVerdict::Rejected { reason } => {
          info!(%reason, amount = quote.amount, "Payment not verified; asking the caller to pay.");
          let mut guard = ctx.write();
          guard.rejection_reason = Some(reason);
          guard.transition(PurchaseState::PaymentRequired);
          Ok::<_, PaygateError>(FlowControl::Stop)
        }
      }
    }
  });

  let d = deps.clone();
  flow.on_step(APPLY_PURCHASE, move |ctx: ContextData<PurchaseCtxData>| {
    let deps = d.clone();
    async move {
      let application = {
        let guard = ctx.read();
        let proof = guard
          .proof
          .clone()
          .ok_or_else(|| PaygateError::Internal("applying a purchase without a verified payment".to_string()))?;
        PurchaseApplication {
          wallet_id: deps.settings.wallet_id,
          products: guard.products.clone(),
          total: guard.total(),
          proof,
        }
      };

      match deps.ledger.apply_purchase(application).await? {
        ApplyOutcome::Applied {
          orders,
          remaining_credit,
        } => {
          info!(orders = orders.len(), remaining_credit, "Orders recorded and wallet debited.");
          let mut guard = ctx.write();
          guard.orders = orders;
          guard.transition(PurchaseState::OrderRecorded);
          guard.remaining_credit = Some(remaining_credit);
          guard.transition(PurchaseState::LedgerDebited);
          Ok(FlowControl::Continue)
        }
        ApplyOutcome::AlreadyApplied { orders } => {
          warn!(orders = orders.len(), "Payment proof was already applied; not charging again.");
          let mut guard = ctx.write();
          guard.orders = orders;
          guard.replayed = true;
          Ok::<_, PaygateError>(FlowControl::Stop)
        }
      }
    }
  });

  let d = deps;
  flow.on_step(NOTIFY_BUYER, move |ctx: ContextData<PurchaseCtxData>| {
    let deps = d.clone();
    async move {
      let (wallet, products, total) = {
        let guard = ctx.read();
        (guard.wallet.clone(), guard.products.clone(), guard.total())
      };
      let Some(wallet) = wallet else {
        return Err(PaygateError::Internal("notifying without a resolved wallet".to_string()));
      };

      let report = deps.dispatcher.order_confirmed(&wallet, &products, total).await?;
      let mut guard = ctx.write();
      guard.notification = Some(report);
      guard.transition(PurchaseState::Notified);
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  flow
}
