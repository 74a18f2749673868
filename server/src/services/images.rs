// server/src/services/images.rs

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use paygate::error::{PaygateError, Result};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// A product image ready to embed in a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
  pub data: String,
  pub mime_type: String,
}

/// Downloads product images and encodes them as base64.
///
/// A failed download is logged and yields `None`; a missing picture never
/// fails the tool call it decorates.
pub struct ImageFetcher {
  client: reqwest::Client,
}

impl ImageFetcher {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| PaygateError::Internal(format!("building image client: {}", e)))?;
    Ok(Self { client })
  }

  #[instrument(name = "images::fetch", skip(self))]
  pub async fn fetch(&self, url: &str) -> Option<InlineImage> {
    if url.trim().is_empty() {
      return None;
    }
    match self.download(url).await {
      Ok(image) => {
        debug!(mime_type = %image.mime_type, encoded_len = image.data.len(), "Fetched product image.");
        Some(image)
      }
      Err(e) => {
        warn!(error = %e, "Skipping product image.");
        None
      }
    }
  }

  async fn download(&self, url: &str) -> std::result::Result<InlineImage, reqwest::Error> {
    let response = self.client.get(url).send().await?.error_for_status()?;
    let mime_type = response
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .filter(|v| !v.is_empty())
      .unwrap_or(DEFAULT_MIME_TYPE)
      .to_string();
    let bytes = response.bytes().await?;
    Ok(InlineImage {
      data: STANDARD.encode(&bytes),
      mime_type,
    })
  }
}
