// core/src/discovery/mod.rs

//! Two-pass natural-language product discovery.
//!
//! Pass one asks the oracle which catalog categories might match the request.
//! Pass two shows it every product of those categories and asks it to pick a
//! handful. Nothing is cached between calls.

mod context;
mod extract;
mod prompts;
mod steps;

pub use context::DiscoveryCtxData;
pub use extract::extract_ids;
pub use steps::{GATHER_CANDIDATES, LOAD_CATEGORIES, MATCH_CATEGORIES, SELECT_PRODUCTS};

use crate::catalog::CatalogGateway;
use crate::error::{ErrorKind, PaygateError};
use crate::flow::{ContextData, Flow, FlowOutcome};
use crate::models::Product;
use crate::oracle::Oracle;
use crate::settings::DiscoverySettings;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
  Success,
  NoMatch,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindProductsResponse {
  pub status: DiscoveryStatus,
  pub products: Vec<Product>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_kind: Option<ErrorKind>,
}

impl FindProductsResponse {
  fn success(products: Vec<Product>) -> Self {
    Self {
      status: DiscoveryStatus::Success,
      products,
      message: None,
      error_kind: None,
    }
  }

  fn no_match() -> Self {
    Self {
      status: DiscoveryStatus::NoMatch,
      products: Vec::new(),
      message: None,
      error_kind: None,
    }
  }

  fn failed(err: &PaygateError) -> Self {
    Self {
      status: DiscoveryStatus::Error,
      products: Vec::new(),
      message: Some(err.public_message()),
      error_kind: Some(err.kind()),
    }
  }
}

pub struct DiscoveryFunnel {
  flow: Flow<DiscoveryCtxData, PaygateError>,
}

impl DiscoveryFunnel {
  pub fn new(catalog: Arc<dyn CatalogGateway>, oracle: Arc<dyn Oracle>, settings: DiscoverySettings) -> Self {
    Self {
      flow: steps::build_discovery_flow(catalog, oracle, settings),
    }
  }

  /// Resolves free text to catalog products. Never fails: errors are folded
  /// into a response with status `error`.
  #[instrument(name = "discovery::find_products", skip_all, fields(input_len = input_text.len()))]
  pub async fn find_products(&self, input_text: &str) -> FindProductsResponse {
    let input_text = input_text.trim();
    if input_text.is_empty() {
      let err = PaygateError::Validation("describe what you are looking for".to_string());
      info!("Rejected empty discovery request.");
      return FindProductsResponse::failed(&err);
    }

    let ctx = ContextData::new(DiscoveryCtxData::new(input_text));
    match self.flow.run(ctx.clone()).await {
      Ok(FlowOutcome::Completed) => {
        let products = ctx.snapshot().products;
        info!(count = products.len(), "Discovery completed.");
        FindProductsResponse::success(products)
      }
      Ok(FlowOutcome::Stopped { step }) => {
        info!(%step, "Discovery found no matching category.");
        FindProductsResponse::no_match()
      }
      Err(err) => {
        error!(error = %err, "Discovery failed.");
        FindProductsResponse::failed(&err)
      }
    }
  }
}
