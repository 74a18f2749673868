// core/src/discovery/context.rs

use crate::models::{CategoryCandidate, Product};
use crate::oracle::OracleMessage;

/// State carried through one discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryCtxData {
  pub input_text: String,
  pub categories: Vec<CategoryCandidate>,
  pub conversation: Vec<OracleMessage>,
  pub category_ids: Vec<i64>,
  pub candidates: Vec<Product>,
  pub selected_ids: Vec<i64>,
  pub products: Vec<Product>,
}

impl DiscoveryCtxData {
  pub fn new(input_text: impl Into<String>) -> Self {
    Self {
      input_text: input_text.into(),
      ..Default::default()
    }
  }
}
