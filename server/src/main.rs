// server/src/main.rs

mod config;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, LedgerBackend};
use crate::errors::{AppError, Result as AppResult};
use crate::services::{seeded_memory_ledger, ImageFetcher, LogMailer, OpenAiConfig, OpenAiOracle, PgLedger, ResendMailer, RESEND_API_URL};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use paygate::ledger::LedgerStore;
use paygate::notify::NotificationSink;
use paygate::{DiscoveryFunnel, HttpCatalogGateway, HttpFacilitatorClient, NotificationDispatcher, PurchaseOrchestrator};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

async fn build_ledger(config: &AppConfig) -> AppResult<Arc<dyn LedgerStore>> {
  match config.ledger_backend {
    LedgerBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres ledger".to_string()))?;
      let pool = PgPool::connect(url).await?;
      tracing::info!("Successfully connected to the database.");
      Ok(Arc::new(PgLedger::new(pool)))
    }
    LedgerBackend::Memory => {
      tracing::warn!("Using the in-memory ledger; orders are lost on restart.");
      Ok(Arc::new(seeded_memory_ledger(
        config.ledger_seed_path.as_deref(),
        config.wallet_id,
      )?))
    }
  }
}

fn build_mailer(config: &AppConfig) -> AppResult<Arc<dyn NotificationSink>> {
  match &config.resend_key {
    Some(key) => Ok(Arc::new(ResendMailer::new(
      RESEND_API_URL,
      key.clone(),
      config.email_sender.clone(),
      config.http_timeout,
    )?)),
    None => {
      tracing::warn!("RESEND_KEY not set; order mails will only be logged.");
      Ok(Arc::new(LogMailer::new(config.email_sender.clone())))
    }
  }
}

async fn build_state(config: &AppConfig) -> AppResult<AppState> {
  let ledger = build_ledger(config).await?;
  let catalog = Arc::new(HttpCatalogGateway::new(config.catalog_base_url.clone(), config.http_timeout)?);
  let facilitator = Arc::new(HttpFacilitatorClient::new(
    config.facilitator_url.clone(),
    config.facilitator_timeout,
  )?);
  let oracle = Arc::new(OpenAiOracle::new(OpenAiConfig {
    api_key: config.openai_api_key.clone(),
    base_url: config.openai_base_url.clone(),
    model: config.openai_model.clone(),
    timeout: config.http_timeout,
  })?);
  let dispatcher = Arc::new(NotificationDispatcher::new(
    build_mailer(config)?,
    config.notification_settings(),
  ));

  Ok(AppState {
    discovery: Arc::new(DiscoveryFunnel::new(catalog, oracle, config.discovery_settings())),
    purchases: Arc::new(PurchaseOrchestrator::new(
      ledger,
      facilitator,
      dispatcher.clone(),
      config.purchase_settings(),
    )),
    dispatcher,
    seller_address: Arc::from(config.seller_wallet.as_str()),
    images: Arc::new(ImageFetcher::new(config.http_timeout)?),
  })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting paygate tool server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let app_state = match build_state(&app_config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise services.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
