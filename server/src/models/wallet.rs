// server/src/models/wallet.rs

use paygate::models::Wallet;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct WalletRow {
  pub uuid: Uuid,
  pub credit: i64,
  pub name: Option<String>,
  pub email: Option<String>,
}

impl From<WalletRow> for Wallet {
  fn from(row: WalletRow) -> Self {
    Wallet {
      id: row.uuid,
      credit: row.credit,
      name: row.name,
      email: row.email,
    }
  }
}
