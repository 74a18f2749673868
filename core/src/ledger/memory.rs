// core/src/ledger/memory.rs

use super::{ApplyOutcome, LedgerStore, PurchaseApplication};
use crate::error::{PaygateError, Result, UpstreamService};
use crate::models::{Order, Product, ProductId, Wallet};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default)]
struct LedgerState {
  wallets: HashMap<Uuid, Wallet>,
  products: BTreeMap<ProductId, Product>,
  orders: Vec<Order>,
  applied_proofs: HashSet<String>,
}

/// A ledger held in process memory.
///
/// One mutex guards the whole state, so `apply_purchase` is atomic with
/// respect to every other ledger call. Used by tests and by the server's
/// `memory` backend.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
  state: Arc<Mutex<LedgerState>>,
  unavailable: Arc<AtomicBool>,
}

impl InMemoryLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_wallet(self, wallet: Wallet) -> Self {
    self.state.lock().wallets.insert(wallet.id, wallet);
    self
  }

  pub fn with_products(self, products: impl IntoIterator<Item = Product>) -> Self {
    {
      let mut state = self.state.lock();
      for product in products {
        state.products.insert(product.id, product);
      }
    }
    self
  }

  /// Makes every call fail as if the backing store were unreachable.
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  pub fn orders(&self) -> Vec<Order> {
    self.state.lock().orders.clone()
  }

  pub fn wallet_credit(&self, wallet_id: Uuid) -> Option<i64> {
    self.state.lock().wallets.get(&wallet_id).map(|w| w.credit)
  }

  fn check_available(&self) -> Result<()> {
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(PaygateError::upstream(UpstreamService::Ledger, "in-memory ledger marked unavailable"));
    }
    Ok(())
  }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
  async fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
    self.check_available()?;
    Ok(self.state.lock().wallets.get(&wallet_id).cloned())
  }

  async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
    self.check_available()?;
    let wanted: HashSet<ProductId> = ids.iter().copied().collect();
    let state = self.state.lock();
    Ok(
      state
        .products
        .values()
        .filter(|p| wanted.contains(&p.id))
        .cloned()
        .collect(),
    )
  }

  async fn apply_purchase(&self, application: PurchaseApplication) -> Result<ApplyOutcome> {
    self.check_available()?;
    let mut state = self.state.lock();
    let proof_key = application.proof.as_str().to_string();

    if state.applied_proofs.contains(&proof_key) {
      let orders = state
        .orders
        .iter()
        .filter(|o| o.payment_proof == proof_key)
        .cloned()
        .collect();
      info!(proof = %application.proof, "Payment proof already applied; ledger unchanged.");
      return Ok(ApplyOutcome::AlreadyApplied { orders });
    }

    let orders: Vec<Order> = application
      .products
      .iter()
      .map(|p| Order::paid_line(application.wallet_id, p, &application.proof))
      .collect();

    let remaining_credit = match state.wallets.get_mut(&application.wallet_id) {
      Some(wallet) => {
        let remaining = wallet.credit.checked_sub(application.total).ok_or_else(|| {
          PaygateError::Internal(format!("debiting {} overflows wallet credit", application.total))
        })?;
        wallet.credit = remaining;
        remaining
      }
      None => return Err(PaygateError::NotFound(format!("wallet {}", application.wallet_id))),
    };
    state.orders.extend(orders.iter().cloned());
    state.applied_proofs.insert(proof_key);

    debug!(orders = orders.len(), remaining_credit, "Purchase applied to in-memory ledger.");
    Ok(ApplyOutcome::Applied {
      orders,
      remaining_credit,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::PaymentProof;

  fn product(id: ProductId, price: i64) -> Product {
    Product {
      id,
      name: format!("Product {}", id),
      price,
      image: format!("https://img/{}.png", id),
    }
  }

  fn ledger_with_wallet(credit: i64) -> (InMemoryLedger, Uuid) {
    let wallet_id = Uuid::new_v4();
    let ledger = InMemoryLedger::new()
      .with_wallet(Wallet {
        id: wallet_id,
        credit,
        name: Some("Ada".into()),
        email: Some("ada@example.com".into()),
      })
      .with_products([product(1, 100), product(2, 250), product(3, 75)]);
    (ledger, wallet_id)
  }

  #[tokio::test]
  async fn lookup_returns_each_product_once() {
    let (ledger, _) = ledger_with_wallet(0);
    let found = ledger.products_by_ids(&[2, 2, 3, 99]).await.unwrap();
    let ids: Vec<_> = found.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 3]);
  }

  #[tokio::test]
  async fn second_application_of_a_proof_changes_nothing() {
    let (ledger, wallet_id) = ledger_with_wallet(1_000);
    let application = PurchaseApplication {
      wallet_id,
      products: vec![product(1, 100), product(2, 250)],
      total: 350,
      proof: PaymentProof::new("tx-1"),
    };

    let first = ledger.apply_purchase(application.clone()).await.unwrap();
    assert!(matches!(first, ApplyOutcome::Applied { remaining_credit: 650, .. }));

    let second = ledger.apply_purchase(application).await.unwrap();
    match second {
      ApplyOutcome::AlreadyApplied { orders } => assert_eq!(orders.len(), 2),
      other => panic!("expected AlreadyApplied, got {:?}", other),
    }
    assert_eq!(ledger.orders().len(), 2);
    assert_eq!(ledger.wallet_credit(wallet_id), Some(650));
  }

  #[tokio::test]
  async fn credit_may_go_negative() {
    let (ledger, wallet_id) = ledger_with_wallet(50);
    let outcome = ledger
      .apply_purchase(PurchaseApplication {
        wallet_id,
        products: vec![product(3, 75)],
        total: 75,
        proof: PaymentProof::new("tx-neg"),
      })
      .await
      .unwrap();
    assert!(matches!(outcome, ApplyOutcome::Applied { remaining_credit: -25, .. }));
  }

  #[tokio::test]
  async fn unknown_wallet_is_rejected_without_claiming_the_proof() {
    let (ledger, _) = ledger_with_wallet(0);
    let err = ledger
      .apply_purchase(PurchaseApplication {
        wallet_id: Uuid::new_v4(),
        products: vec![product(1, 100)],
        total: 100,
        proof: PaymentProof::new("tx-x"),
      })
      .await
      .unwrap_err();
    assert!(matches!(err, PaygateError::NotFound(_)));
    assert!(ledger.orders().is_empty());
  }

  #[tokio::test]
  async fn overflowing_debit_fails_and_leaves_the_wallet_alone() {
    let (ledger, wallet_id) = ledger_with_wallet(i64::MIN + 10);
    let application = PurchaseApplication {
      wallet_id,
      products: vec![product(1, 100)],
      total: 100,
      proof: PaymentProof::new("tx-overflow"),
    };

    let err = ledger.apply_purchase(application.clone()).await.unwrap_err();
    assert!(matches!(err, PaygateError::Internal(_)));
    assert!(ledger.orders().is_empty());
    assert_eq!(ledger.wallet_credit(wallet_id), Some(i64::MIN + 10));

    // The proof was not claimed, so a later attempt is evaluated afresh.
    let retry = ledger.apply_purchase(application).await.unwrap_err();
    assert!(matches!(retry, PaygateError::Internal(_)));
  }
}
