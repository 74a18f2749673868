// core/src/ledger/mod.rs

//! Wallet balance and order records.

mod memory;

pub use memory::InMemoryLedger;

use crate::error::Result;
use crate::models::{Order, PaymentProof, Product, ProductId, Wallet};
use async_trait::async_trait;
use uuid::Uuid;

/// Everything needed to record one verified purchase.
#[derive(Debug, Clone)]
pub struct PurchaseApplication {
  pub wallet_id: Uuid,
  pub products: Vec<Product>,
  pub total: i64,
  pub proof: PaymentProof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
  /// Orders were written and the wallet was debited.
  Applied { orders: Vec<Order>, remaining_credit: i64 },
  /// The proof had been applied before; nothing changed.
  AlreadyApplied { orders: Vec<Order> },
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
  async fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>>;

  /// Products whose id is in `ids`, each at most once.
  async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

  /// Claims `application.proof`, inserts one paid order per product and
  /// decrements the wallet credit by `application.total`, all or nothing.
  ///
  /// The debit must be a single conditional update on the stored value so
  /// that concurrent purchases cannot lose an update.
  async fn apply_purchase(&self, application: PurchaseApplication) -> Result<ApplyOutcome>;
}
