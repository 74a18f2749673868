// server/src/models/order.rs

use chrono::{DateTime, Utc};
use paygate::models::Order;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub wallet: Uuid,
  pub product_id: i64,
  pub title: String,
  pub image: Option<String>,
  pub price: i64,
  pub paid: bool,
  pub payment_proof: String,
  pub created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
  fn from(row: OrderRow) -> Self {
    Order {
      id: row.id,
      wallet: row.wallet,
      product_id: row.product_id,
      title: row.title,
      image: row.image.unwrap_or_default(),
      price: row.price,
      paid: row.paid,
      payment_proof: row.payment_proof,
      created_at: row.created_at,
    }
  }
}
