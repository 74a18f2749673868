// server/src/models/product.rs

use paygate::models::Product;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: i64,
  pub name: String,
  pub price: i64,
  pub image: Option<String>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      price: row.price,
      image: row.image.unwrap_or_default(),
    }
  }
}
