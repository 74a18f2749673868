// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every fake.

use async_trait::async_trait;
use paygate::catalog::CatalogGateway;
use paygate::error::{PaygateError, Result, UpstreamService};
use paygate::facilitator::PaymentFacilitator;
use paygate::models::{CategoryCandidate, PaymentProof, PaymentQuote, PaymentVerdict, Product, ProductId, Wallet};
use paygate::notify::{EmailMessage, NotificationSink};
use paygate::oracle::{Oracle, OracleReply, OracleRequest};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Tracing ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub const SELLER: &str = "3BMEwjrn9gBfSetARPrAK1nPTXMRsvQzZLN1n4CYjpcU";

pub fn product(id: ProductId, name: &str, price: i64) -> Product {
  Product {
    id,
    name: name.to_string(),
    price,
    image: format!("https://img.example/{}.jpg", id),
  }
}

pub fn buyer_wallet(credit: i64) -> Wallet {
  Wallet {
    id: Uuid::new_v4(),
    credit,
    name: Some("Ada".to_string()),
    email: Some("ada@example.com".to_string()),
  }
}

pub fn category(id: i64, name: &str) -> CategoryCandidate {
  CategoryCandidate {
    id,
    name: name.to_string(),
  }
}

// --- Oracle ---

/// Answers with pre-scripted replies in order and records every request.
#[derive(Default)]
pub struct ScriptedOracle {
  replies: Mutex<VecDeque<Result<OracleReply>>>,
  pub requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
  pub fn new(replies: Vec<Result<OracleReply>>) -> Arc<Self> {
    Arc::new(Self {
      replies: Mutex::new(replies.into()),
      requests: Mutex::new(Vec::new()),
    })
  }

  pub fn calls(&self) -> usize {
    self.requests.lock().len()
  }
}

#[async_trait]
impl Oracle for ScriptedOracle {
  async fn complete(&self, request: &OracleRequest) -> Result<OracleReply> {
    self.requests.lock().push(request.clone());
    self
      .replies
      .lock()
      .pop_front()
      .unwrap_or_else(|| Err(PaygateError::upstream(UpstreamService::Oracle, "no scripted reply left")))
  }
}

// --- Catalog ---

#[derive(Default)]
pub struct StaticCatalog {
  pub categories: Vec<CategoryCandidate>,
  pub products: HashMap<i64, Vec<Product>>,
  pub down: bool,
  pub product_fetches: AtomicUsize,
}

impl StaticCatalog {
  pub fn new(categories: Vec<CategoryCandidate>, products: Vec<(i64, Vec<Product>)>) -> Arc<Self> {
    Arc::new(Self {
      categories,
      products: products.into_iter().collect(),
      down: false,
      product_fetches: AtomicUsize::new(0),
    })
  }

  pub fn unreachable() -> Arc<Self> {
    Arc::new(Self {
      down: true,
      ..Default::default()
    })
  }
}

#[async_trait]
impl CatalogGateway for StaticCatalog {
  async fn categories(&self) -> Result<Vec<CategoryCandidate>> {
    if self.down {
      return Err(PaygateError::upstream(UpstreamService::Catalog, "connection refused"));
    }
    Ok(self.categories.clone())
  }

  async fn category_products(&self, category_id: i64) -> Result<Vec<Product>> {
    self.product_fetches.fetch_add(1, Ordering::SeqCst);
    Ok(self.products.get(&category_id).cloned().unwrap_or_default())
  }
}

// --- Facilitator ---

#[derive(Debug, Clone)]
pub enum FacilitatorScript {
  /// Approve with the given transaction id.
  Approve(String),
  /// Approve with the signed payload itself as the transaction id.
  EchoPayload,
  Reject(String),
  Unreachable,
}

/// Mirrors the HTTP client's contract: a quote without a payload is rejected
/// without counting as a call.
pub struct StubFacilitator {
  script: Mutex<FacilitatorScript>,
  pub calls: AtomicUsize,
  pub last_quote: Mutex<Option<PaymentQuote>>,
}

impl StubFacilitator {
  pub fn new(script: FacilitatorScript) -> Arc<Self> {
    Arc::new(Self {
      script: Mutex::new(script),
      calls: AtomicUsize::new(0),
      last_quote: Mutex::new(None),
    })
  }

  pub fn set_script(&self, script: FacilitatorScript) {
    *self.script.lock() = script;
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl PaymentFacilitator for StubFacilitator {
  async fn verify(&self, quote: &PaymentQuote) -> Result<PaymentVerdict> {
    if quote.payload().is_none() {
      return Ok(PaymentVerdict::rejected("no signed payment payload supplied"));
    }
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_quote.lock() = Some(quote.clone());
    match self.script.lock().clone() {
      FacilitatorScript::Approve(txid) => Ok(PaymentVerdict::Approved {
        proof: PaymentProof::new(txid),
      }),
      FacilitatorScript::EchoPayload => Ok(PaymentVerdict::Approved {
        proof: PaymentProof::new(quote.payload().unwrap_or_default()),
      }),
      FacilitatorScript::Reject(reason) => Ok(PaymentVerdict::Rejected { reason }),
      FacilitatorScript::Unreachable => Err(PaygateError::upstream(UpstreamService::Facilitator, "timed out")),
    }
  }
}

// --- Mail ---

#[derive(Default)]
pub struct RecordingSink {
  pub sent: Mutex<Vec<EmailMessage>>,
  failing: AtomicBool,
}

impl RecordingSink {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn failing() -> Arc<Self> {
    let sink = Self::default();
    sink.failing.store(true, Ordering::SeqCst);
    Arc::new(sink)
  }

  pub fn recipients(&self) -> Vec<String> {
    self.sent.lock().iter().map(|m| m.to.clone()).collect()
  }
}

#[async_trait]
impl NotificationSink for RecordingSink {
  async fn send(&self, message: &EmailMessage) -> Result<()> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(PaygateError::upstream(UpstreamService::Mail, "mail relay rejected the message"));
    }
    self.sent.lock().push(message.clone());
    Ok(())
  }
}
