// core/src/settings.rs

//! Plain settings handed to the services at construction. Nothing in this
//! crate reads the environment; the binary builds these from its config.

use uuid::Uuid;

pub const DEFAULT_MAX_SELECTIONS: usize = 6;

#[derive(Debug, Clone)]
pub struct PurchaseSettings {
  /// Wallet debited by every purchase handled by this instance.
  pub wallet_id: Uuid,
  /// Address the buyer has to pay.
  pub seller_address: String,
}

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
  /// Upper bound on products returned by the second oracle pass.
  pub max_selections: usize,
}

impl Default for DiscoverySettings {
  fn default() -> Self {
    Self {
      max_selections: DEFAULT_MAX_SELECTIONS,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NotificationSettings {
  pub brand: String,
  pub currency_symbol: String,
  pub minor_units_per_major: i64,
  /// Receive a summary of every order.
  pub admin_recipients: Vec<String>,
  /// Buyers whose orders are not broadcast to the admins.
  pub excluded_buyers: Vec<String>,
}

impl Default for NotificationSettings {
  fn default() -> Self {
    Self {
      brand: "Latinum".to_string(),
      currency_symbol: "€".to_string(),
      minor_units_per_major: 100,
      admin_recipients: Vec::new(),
      excluded_buyers: Vec::new(),
    }
  }
}

impl NotificationSettings {
  pub fn is_excluded(&self, buyer_email: &str) -> bool {
    self
      .excluded_buyers
      .iter()
      .any(|e| e.eq_ignore_ascii_case(buyer_email))
  }
}
