// core/src/models/wallet.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The buyer's account in the ledger. `credit` is a running balance in the
/// minor currency unit and may go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
  pub id: Uuid,
  pub credit: i64,
  pub name: Option<String>,
  pub email: Option<String>,
}
