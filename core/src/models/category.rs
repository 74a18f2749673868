// core/src/models/category.rs

use serde::{Deserialize, Serialize};

/// A catalog category offered to the oracle during the first discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCandidate {
  pub id: i64,
  pub name: String,
}
