// core/src/models/order.rs

use super::product::{Product, ProductId};
use super::quote::PaymentProof;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One purchased line item. Written once when a verified payment is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub wallet: Uuid,
  pub product_id: ProductId,
  pub title: String,
  pub image: String,
  pub price: i64,
  pub paid: bool,
  pub payment_proof: String,
  pub created_at: DateTime<Utc>,
}

impl Order {
  pub fn paid_line(wallet: Uuid, product: &Product, proof: &PaymentProof) -> Self {
    Order {
      id: Uuid::new_v4(),
      wallet,
      product_id: product.id,
      title: product.name.clone(),
      image: product.image.clone(),
      price: product.price,
      paid: true,
      payment_proof: proof.as_str().to_string(),
      created_at: Utc::now(),
    }
  }
}
