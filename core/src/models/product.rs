// core/src/models/product.rs

use serde::{Deserialize, Serialize};

pub type ProductId = i64;

/// A catalog item. Prices are integers in the minor currency unit.
///
/// The aliases accept the field names used by the upstream menu service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  #[serde(alias = "product_id")]
  pub id: ProductId,
  #[serde(alias = "product_name")]
  pub name: String,
  #[serde(alias = "full_price")]
  pub price: i64,
  #[serde(alias = "thumb_image", default)]
  pub image: String,
}

/// Sum of the prices, or `None` on overflow.
pub fn total_price(products: &[Product]) -> Option<i64> {
  products.iter().try_fold(0i64, |acc, p| acc.checked_add(p.price))
}
