// core/src/discovery/steps.rs

//! The discovery flow: categories → oracle pick → candidates → oracle pick.

use super::context::DiscoveryCtxData;
use super::extract::extract_ids;
use super::prompts;
use crate::catalog::CatalogGateway;
use crate::error::PaygateError;
use crate::flow::{ContextData, Flow, FlowControl};
use crate::oracle::{Oracle, OracleReply, OracleRequest};
use crate::settings::DiscoverySettings;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub const LOAD_CATEGORIES: &str = "load_categories";
pub const MATCH_CATEGORIES: &str = "match_categories";
pub const GATHER_CANDIDATES: &str = "gather_candidates";
pub const SELECT_PRODUCTS: &str = "select_products";

/// Structured ids when the oracle produced them, bracket extraction otherwise.
fn reply_ids(reply: &OracleReply) -> Vec<i64> {
  match &reply.ids {
    Some(ids) => ids.clone(),
    None => extract_ids(&reply.text),
  }
}

fn dedup_in_order(ids: Vec<i64>) -> Vec<i64> {
  let mut seen = HashSet::new();
  ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

pub(crate) fn build_discovery_flow(
  catalog: Arc<dyn CatalogGateway>,
  oracle: Arc<dyn Oracle>,
  settings: DiscoverySettings,
) -> Flow<DiscoveryCtxData, PaygateError> {
  let mut flow = Flow::<DiscoveryCtxData, PaygateError>::new(
    "discovery",
    &[
      (LOAD_CATEGORIES, false, None),
      (MATCH_CATEGORIES, false, None),
      (GATHER_CANDIDATES, false, None),
      (SELECT_PRODUCTS, false, None),
    ],
  );

  let catalog_for_categories = catalog.clone();
  flow.on_step(LOAD_CATEGORIES, move |ctx: ContextData<DiscoveryCtxData>| {
    let catalog = catalog_for_categories.clone();
    async move {
      let categories = catalog.categories().await?;
      info!(count = categories.len(), "Loaded catalog categories.");
      ctx.write().categories = categories;
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  let oracle_for_categories = oracle.clone();
  flow.on_step(MATCH_CATEGORIES, move |ctx: ContextData<DiscoveryCtxData>| {
    let oracle = oracle_for_categories.clone();
    async move {
      let request = {
        let mut guard = ctx.write();
        let mut conversation = prompts::opening(&guard.input_text);
        conversation.push(prompts::category_question(&guard.categories));
        guard.conversation = conversation.clone();
        OracleRequest { messages: conversation }
      };

      let reply = oracle.complete(&request).await?;
      let category_ids = dedup_in_order(reply_ids(&reply));
      info!(?category_ids, "Oracle matched categories.");
      if category_ids.is_empty() {
        return Ok(FlowControl::Stop);
      }
      ctx.write().category_ids = category_ids;
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  let catalog_for_candidates = catalog;
  flow.on_step(GATHER_CANDIDATES, move |ctx: ContextData<DiscoveryCtxData>| {
    let catalog = catalog_for_candidates.clone();
    async move {
      let category_ids = ctx.read().category_ids.clone();
      let mut candidates = Vec::new();
      for category_id in category_ids {
        candidates.extend(catalog.category_products(category_id).await?);
      }
      // An empty candidate list still goes to the second pass.
      info!(count = candidates.len(), "Gathered candidate products.");
      ctx.write().candidates = candidates;
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  let max_selections = settings.max_selections;
  flow.on_step(SELECT_PRODUCTS, move |ctx: ContextData<DiscoveryCtxData>| {
    let oracle = oracle.clone();
    async move {
      let request = {
        let mut guard = ctx.write();
        let question = prompts::product_question(&guard.candidates, max_selections)
          .map_err(|e| PaygateError::Internal(format!("serializing candidates: {}", e)))?;
        guard.conversation.push(question);
        OracleRequest {
          messages: guard.conversation.clone(),
        }
      };

      let reply = oracle.complete(&request).await?;
      let mut selected_ids = dedup_in_order(reply_ids(&reply));
      selected_ids.truncate(max_selections);
      let wanted: HashSet<i64> = selected_ids.iter().copied().collect();

      let mut guard = ctx.write();
      let mut emitted = HashSet::new();
      let products = guard
        .candidates
        .iter()
        .filter(|p| wanted.contains(&p.id) && emitted.insert(p.id))
        .cloned()
        .collect::<Vec<_>>();
      info!(selected = selected_ids.len(), returned = products.len(), "Oracle selected products.");
      guard.selected_ids = selected_ids;
      guard.products = products;
      Ok::<_, PaygateError>(FlowControl::Continue)
    }
  });

  flow
}
