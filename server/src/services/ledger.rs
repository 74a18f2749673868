// server/src/services/ledger.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{OrderRow, ProductRow, WalletRow};
use async_trait::async_trait;
use paygate::error::{PaygateError, Result, UpstreamService};
use paygate::ledger::{ApplyOutcome, InMemoryLedger, LedgerStore, PurchaseApplication};
use paygate::models::{Order, Product, ProductId, Wallet};
use serde::Deserialize;
use sqlx::PgPool;
use std::path::Path;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn ledger_err(e: sqlx::Error) -> PaygateError {
  PaygateError::upstream(UpstreamService::Ledger, e.to_string())
}

/// Ledger backed by the Postgres tables in `schema.sql`.
#[derive(Clone)]
pub struct PgLedger {
  pool: PgPool,
}

impl PgLedger {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn orders_for_proof(&self, proof: &str) -> Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(
      "SELECT id, wallet, product_id, title, image, price, paid, payment_proof, created_at \
       FROM orders WHERE payment_proof = $1 ORDER BY created_at, id",
    )
    .bind(proof)
    .fetch_all(&self.pool)
    .await
    .map_err(ledger_err)?;
    Ok(rows.into_iter().map(Order::from).collect())
  }
}

#[async_trait]
impl LedgerStore for PgLedger {
  #[instrument(name = "ledger::wallet", skip(self), err(Display))]
  async fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
    let row = sqlx::query_as::<_, WalletRow>("SELECT uuid, credit, name, email FROM wallet WHERE uuid = $1")
      .bind(wallet_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(ledger_err)?;
    Ok(row.map(Wallet::from))
  }

  #[instrument(name = "ledger::products_by_ids", skip(self), fields(requested = ids.len()), err(Display))]
  async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>("SELECT id, name, price, image FROM product WHERE id = ANY($1) ORDER BY id")
      .bind(ids)
      .fetch_all(&self.pool)
      .await
      .map_err(ledger_err)?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  #[instrument(
    name = "ledger::apply_purchase",
    skip_all,
    fields(wallet = %application.wallet_id, total = application.total, proof = %application.proof),
    err(Display)
  )]
  async fn apply_purchase(&self, application: PurchaseApplication) -> Result<ApplyOutcome> {
    let mut tx = self.pool.begin().await.map_err(ledger_err)?;

    let remaining_credit: Option<i64> =
      sqlx::query_scalar("UPDATE wallet SET credit = credit - $1 WHERE uuid = $2 RETURNING credit")
        .bind(application.total)
        .bind(application.wallet_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(ledger_err)?;
    let Some(remaining_credit) = remaining_credit else {
      tx.rollback().await.map_err(ledger_err)?;
      return Err(PaygateError::NotFound(format!("wallet {}", application.wallet_id)));
    };

    // A concurrent claim of the same proof blocks here until the other
    // transaction finishes, then conflicts.
    let claimed = sqlx::query(
      "INSERT INTO payment_applications (proof, wallet, total) VALUES ($1, $2, $3) ON CONFLICT (proof) DO NOTHING",
    )
    .bind(application.proof.as_str())
    .bind(application.wallet_id)
    .bind(application.total)
    .execute(&mut *tx)
    .await
    .map_err(ledger_err)?
    .rows_affected();

    if claimed == 0 {
      tx.rollback().await.map_err(ledger_err)?;
      info!("Payment proof already applied; ledger unchanged.");
      let orders = self.orders_for_proof(application.proof.as_str()).await?;
      return Ok(ApplyOutcome::AlreadyApplied { orders });
    }

    let orders: Vec<Order> = application
      .products
      .iter()
      .map(|p| Order::paid_line(application.wallet_id, p, &application.proof))
      .collect();
    for order in &orders {
      sqlx::query(
        "INSERT INTO orders (id, wallet, product_id, title, image, price, paid, payment_proof, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
      )
      .bind(order.id)
      .bind(order.wallet)
      .bind(order.product_id)
      .bind(&order.title)
      .bind(&order.image)
      .bind(order.price)
      .bind(order.paid)
      .bind(&order.payment_proof)
      .bind(order.created_at)
      .execute(&mut *tx)
      .await
      .map_err(ledger_err)?;
    }

    tx.commit().await.map_err(ledger_err)?;
    if remaining_credit < 0 {
      warn!(remaining_credit, "Wallet credit is negative after the purchase.");
    }
    info!(orders = orders.len(), remaining_credit, "Purchase applied.");
    Ok(ApplyOutcome::Applied {
      orders,
      remaining_credit,
    })
  }
}

#[derive(Debug, Default, Deserialize)]
struct LedgerSeed {
  #[serde(default)]
  wallets: Vec<Wallet>,
  #[serde(default)]
  products: Vec<Product>,
}

/// Builds the memory backend, loading wallets and products from `seed_path`
/// when given. The configured wallet is created with zero credit if the seed
/// does not contain it.
pub fn seeded_memory_ledger(seed_path: Option<&Path>, wallet_id: Uuid) -> AppResult<InMemoryLedger> {
  let seed = match seed_path {
    Some(path) => {
      let raw = std::fs::read_to_string(path)?;
      serde_json::from_str::<LedgerSeed>(&raw)
        .map_err(|e| AppError::Config(format!("Invalid ledger seed {}: {}", path.display(), e)))?
    }
    None => LedgerSeed::default(),
  };

  let has_wallet = seed.wallets.iter().any(|w| w.id == wallet_id);
  info!(
    wallets = seed.wallets.len(),
    products = seed.products.len(),
    "Seeding in-memory ledger."
  );
  let mut ledger = InMemoryLedger::new().with_products(seed.products);
  for wallet in seed.wallets {
    ledger = ledger.with_wallet(wallet);
  }
  if !has_wallet {
    ledger = ledger.with_wallet(Wallet {
      id: wallet_id,
      credit: 0,
      name: None,
      email: None,
    });
  }
  Ok(ledger)
}
