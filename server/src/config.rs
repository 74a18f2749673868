// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use paygate::settings::{DiscoverySettings, NotificationSettings, PurchaseSettings, DEFAULT_MAX_SELECTIONS};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
  Postgres,
  Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub ledger_backend: LedgerBackend,
  pub database_url: Option<String>,
  /// JSON file with `{wallets, products}` loaded into the memory backend.
  pub ledger_seed_path: Option<PathBuf>,

  pub wallet_id: Uuid,
  pub seller_wallet: String,
  pub facilitator_url: String,
  pub catalog_base_url: String,

  pub openai_api_key: String,
  pub openai_base_url: String,
  pub openai_model: String,

  /// Without a key, mails are only logged.
  pub resend_key: Option<String>,
  pub email_sender: String,
  pub admin_emails: Vec<String>,
  pub admin_excluded_buyers: Vec<String>,

  pub http_timeout: Duration,
  pub facilitator_timeout: Duration,
  pub max_product_selections: usize,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    let config = Self::from_lookup(|name| env::var(name).ok())?;
    tracing::info!(
      backend = ?config.ledger_backend,
      model = %config.openai_model,
      mail = if config.resend_key.is_some() { "resend" } else { "log" },
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  /// Builds the config from any variable source. Blank values count as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let require =
      |name: &str| get(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)));
    let parse_or = |name: &str, default: u64| -> Result<u64> {
      match get(name) {
        Some(raw) => raw
          .parse::<u64>()
          .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
      }
    };

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let ledger_backend = match get("LEDGER_BACKEND").as_deref().map(str::to_ascii_lowercase).as_deref() {
      None | Some("postgres") => LedgerBackend::Postgres,
      Some("memory") => LedgerBackend::Memory,
      Some(other) => {
        return Err(AppError::Config(format!(
          "Invalid LEDGER_BACKEND '{}': expected 'postgres' or 'memory'",
          other
        )))
      }
    };
    let database_url = match ledger_backend {
      LedgerBackend::Postgres => Some(require("DATABASE_URL")?),
      LedgerBackend::Memory => get("DATABASE_URL"),
    };

    let wallet_id = Uuid::parse_str(&require("WALLET_UUID")?)
      .map_err(|e| AppError::Config(format!("Invalid WALLET_UUID: {}", e)))?;

    let admin_emails = split_list(get("ADMIN_EMAILS"));
    let admin_excluded_buyers = match get("ADMIN_EXCLUDED_BUYERS") {
      Some(raw) => split_list(Some(raw)),
      None => admin_emails.clone(),
    };

    let max_product_selections = parse_or("MAX_PRODUCT_SELECTIONS", DEFAULT_MAX_SELECTIONS as u64)? as usize;
    if max_product_selections == 0 {
      return Err(AppError::Config("MAX_PRODUCT_SELECTIONS must be at least 1".to_string()));
    }

    Ok(Self {
      server_host,
      server_port,
      ledger_backend,
      database_url,
      ledger_seed_path: get("LEDGER_SEED_PATH").map(PathBuf::from),
      wallet_id,
      seller_wallet: require("SELLER_WALLET")?,
      facilitator_url: require("FACILITATOR_URL")?,
      catalog_base_url: require("CATALOG_BASE_URL")?,
      openai_api_key: require("OPENAI_API_KEY")?,
      openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
      openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "o4-mini".to_string()),
      resend_key: get("RESEND_KEY"),
      email_sender: get("EMAIL_SENDER").unwrap_or_else(|| "orders@latinum.ai".to_string()),
      admin_emails,
      admin_excluded_buyers,
      http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 15)?),
      facilitator_timeout: Duration::from_secs(parse_or("FACILITATOR_TIMEOUT_SECS", 60)?),
      max_product_selections,
    })
  }

  pub fn purchase_settings(&self) -> PurchaseSettings {
    PurchaseSettings {
      wallet_id: self.wallet_id,
      seller_address: self.seller_wallet.clone(),
    }
  }

  pub fn discovery_settings(&self) -> DiscoverySettings {
    DiscoverySettings {
      max_selections: self.max_product_selections,
    }
  }

  pub fn notification_settings(&self) -> NotificationSettings {
    NotificationSettings {
      admin_recipients: self.admin_emails.clone(),
      excluded_buyers: self.admin_excluded_buyers.clone(),
      ..Default::default()
    }
  }
}

fn split_list(raw: Option<String>) -> Vec<String> {
  raw
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  const WALLET: &str = "6f1c2b9e-1f7a-4a51-9a4e-0d1f4e1b2c3d";

  fn base() -> HashMap<&'static str, &'static str> {
    HashMap::from([
      ("LEDGER_BACKEND", "memory"),
      ("WALLET_UUID", WALLET),
      ("SELLER_WALLET", "seller-address"),
      ("FACILITATOR_URL", "http://localhost:3000/api/facilitator"),
      ("CATALOG_BASE_URL", "http://localhost:4000/menu"),
      ("OPENAI_API_KEY", "sk-test"),
    ])
  }

  fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig> {
    AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
  }

  #[test]
  fn defaults_apply() {
    let config = load(&base()).unwrap();
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.ledger_backend, LedgerBackend::Memory);
    assert_eq!(config.openai_model, "o4-mini");
    assert_eq!(config.email_sender, "orders@latinum.ai");
    assert_eq!(config.facilitator_timeout, Duration::from_secs(60));
    assert_eq!(config.max_product_selections, 6);
    assert!(config.resend_key.is_none());
  }

  #[test]
  fn exclusion_list_defaults_to_admins() {
    let mut vars = base();
    vars.insert("ADMIN_EMAILS", "ops@example.com, owner@example.com ,");
    let config = load(&vars).unwrap();
    assert_eq!(config.admin_emails, vec!["ops@example.com", "owner@example.com"]);
    assert_eq!(config.admin_excluded_buyers, config.admin_emails);

    vars.insert("ADMIN_EXCLUDED_BUYERS", "qa@example.com");
    let config = load(&vars).unwrap();
    assert_eq!(config.notification_settings().excluded_buyers, vec!["qa@example.com"]);
  }

  #[test]
  fn postgres_backend_needs_a_database_url() {
    let mut vars = base();
    vars.insert("LEDGER_BACKEND", "postgres");
    assert!(matches!(load(&vars), Err(AppError::Config(m)) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn rejects_bad_values() {
    let mut vars = base();
    vars.insert("WALLET_UUID", "not-a-uuid");
    assert!(matches!(load(&vars), Err(AppError::Config(_))));

    let mut vars = base();
    vars.insert("LEDGER_BACKEND", "sqlite");
    assert!(matches!(load(&vars), Err(AppError::Config(_))));

    let mut vars = base();
    vars.insert("MAX_PRODUCT_SELECTIONS", "0");
    assert!(matches!(load(&vars), Err(AppError::Config(_))));
  }
}
