// core/src/catalog.rs

//! Remote catalog access: category list and per-category product listings.

use crate::error::{PaygateError, Result, UpstreamService};
use crate::models::{CategoryCandidate, Product};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[async_trait]
pub trait CatalogGateway: Send + Sync {
  async fn categories(&self) -> Result<Vec<CategoryCandidate>>;

  /// All products of a category, flattened across its subcategories.
  async fn category_products(&self, category_id: i64) -> Result<Vec<Product>>;
}

#[derive(Debug, Deserialize)]
struct CategoriesEnvelope {
  categories: Vec<CategoryCandidate>,
}

#[derive(Debug, Deserialize)]
struct CategoryDetail {
  #[serde(default)]
  subcategories: Vec<Subcategory>,
}

#[derive(Debug, Deserialize)]
struct Subcategory {
  #[serde(default)]
  products: Vec<Product>,
}

/// `GET {base}/categories` and `GET {base}/categories/{id}` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogGateway {
  client: reqwest::Client,
  base_url: String,
}

impl HttpCatalogGateway {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| PaygateError::Internal(format!("building catalog client: {}", e)))?;
    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    })
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
    let response = self
      .client
      .get(url)
      .send()
      .await
      .and_then(|r| r.error_for_status())
      .map_err(|e| PaygateError::upstream(UpstreamService::Catalog, e.to_string()))?;
    response
      .json::<T>()
      .await
      .map_err(|e| PaygateError::upstream(UpstreamService::Catalog, format!("decoding {}: {}", url, e)))
  }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
  #[instrument(name = "catalog::categories", skip(self), err(Display))]
  async fn categories(&self) -> Result<Vec<CategoryCandidate>> {
    let url = format!("{}/categories", self.base_url);
    let envelope: CategoriesEnvelope = self.get_json(&url).await?;
    debug!(count = envelope.categories.len(), "Fetched catalog categories.");
    Ok(envelope.categories)
  }

  #[instrument(name = "catalog::category_products", skip(self), err(Display))]
  async fn category_products(&self, category_id: i64) -> Result<Vec<Product>> {
    let url = format!("{}/categories/{}", self.base_url, category_id);
    let detail: CategoryDetail = self.get_json(&url).await?;
    let products: Vec<Product> = detail.subcategories.into_iter().flat_map(|s| s.products).collect();
    debug!(count = products.len(), "Fetched category products.");
    Ok(products)
  }
}
