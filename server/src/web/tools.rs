// server/src/web/tools.rs

//! Tool descriptors and the rendering of tool results for agents.

use crate::services::images::{ImageFetcher, InlineImage};
use paygate::discovery::{DiscoveryStatus, FindProductsResponse};
use paygate::models::ProductId;
use paygate::notify::NotificationDispatcher;
use paygate::purchase::BuyProductsResponse;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const FIND_PRODUCTS: &str = "find_products";
pub const BUY_PRODUCTS: &str = "buy_products";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindProductsArgs {
  #[serde(alias = "input_text")]
  pub input_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyProductsArgs {
  #[serde(alias = "productIDs", alias = "product_ids")]
  pub product_ids: Vec<ProductId>,
  #[serde(default, alias = "signed_payload", alias = "signed_b64_payload")]
  pub signed_payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
  pub name: String,
  #[serde(default)]
  pub arguments: Value,
}

/// One item of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
  Text {
    text: String,
  },
  Image {
    data: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
  },
}

impl Content {
  pub fn text(text: impl Into<String>) -> Self {
    Content::Text { text: text.into() }
  }
}

impl From<InlineImage> for Content {
  fn from(image: InlineImage) -> Self {
    Content::Image {
      data: image.data,
      mime_type: image.mime_type,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
  pub content: Vec<Content>,
  pub is_error: bool,
}

pub fn descriptors() -> Value {
  json!({
    "tools": [
      {
        "name": FIND_PRODUCTS,
        "description": "Find catalog products matching a free-text description of what the user wants.",
        "inputSchema": {
          "type": "object",
          "properties": {
            "inputText": {"type": "string", "description": "What the user is looking for."}
          },
          "required": ["inputText"]
        }
      },
      {
        "name": BUY_PRODUCTS,
        "description": "Buy one or more products. Without a valid signed payment payload the \
                        result states the amount in lamports and the address to pay.",
        "inputSchema": {
          "type": "object",
          "properties": {
            "productIds": {"type": "array", "items": {"type": "integer"}, "minItems": 1},
            "signedPayload": {"type": "string", "description": "Base64 signed payment transaction."}
          },
          "required": ["productIds"]
        }
      }
    ]
  })
}

/// One card per product, each followed by the product image when it could
/// be fetched, or the failure message.
pub async fn render_discovery(
  response: &FindProductsResponse,
  dispatcher: &NotificationDispatcher,
  seller_address: &str,
  images: &ImageFetcher,
) -> ToolResult {
  match response.status {
    DiscoveryStatus::Success if !response.products.is_empty() => {
      let mut content = Vec::with_capacity(response.products.len() * 2);
      for p in &response.products {
        content.push(Content::text(format!(
          "🛒 {}\n💰 Price: {}\nID: {}\nWallet: {}\nLamports: {}",
          p.name,
          dispatcher.format_amount(p.price),
          p.id,
          seller_address,
          p.price
        )));
        if let Some(image) = images.fetch(&p.image).await {
          content.push(image.into());
        }
      }
      ToolResult {
        content,
        is_error: false,
      }
    }
    DiscoveryStatus::Success | DiscoveryStatus::NoMatch => ToolResult {
      content: vec![Content::text("No matching products were found.")],
      is_error: false,
    },
    DiscoveryStatus::Error => ToolResult {
      content: vec![Content::text(
        response
          .message
          .clone()
          .unwrap_or_else(|| "Failed to find products.".to_string()),
      )],
      is_error: true,
    },
  }
}

pub fn render_purchase(response: &BuyProductsResponse) -> ToolResult {
  ToolResult {
    content: vec![Content::text(response.message.clone())],
    is_error: response.status == paygate::purchase::PurchaseStatus::Error,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use paygate::models::Product;
  use paygate::notify::{EmailMessage, NotificationSink};
  use paygate::settings::NotificationSettings;
  use std::sync::Arc;
  use std::time::Duration;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  struct NoMail;

  #[async_trait::async_trait]
  impl NotificationSink for NoMail {
    async fn send(&self, _message: &EmailMessage) -> paygate::Result<()> {
      Ok(())
    }
  }

  fn product(id: i64, name: &str, price: i64, image: String) -> Product {
    Product {
      id,
      name: name.into(),
      price,
      image,
    }
  }

  fn success(products: Vec<Product>) -> FindProductsResponse {
    FindProductsResponse {
      status: DiscoveryStatus::Success,
      products,
      message: None,
      error_kind: None,
    }
  }

  #[tokio::test]
  async fn product_card_shows_price_and_payment_details() {
    let dispatcher = NotificationDispatcher::new(Arc::new(NoMail), NotificationSettings::default());
    let images = ImageFetcher::new(Duration::from_secs(5)).unwrap();
    let response = success(vec![product(7, "Espresso", 250, String::new())]);

    let result = render_discovery(&response, &dispatcher, "seller-1", &images).await;

    assert!(!result.is_error);
    assert_eq!(
      result.content,
      vec![Content::text("🛒 Espresso\n💰 Price: €2.50\nID: 7\nWallet: seller-1\nLamports: 250")]
    );
  }

  #[tokio::test]
  async fn each_card_is_followed_by_its_image_unless_the_download_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/espresso.jpg"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("content-type", "image/jpeg")
          .set_body_bytes(b"abc".to_vec()),
      )
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/gone.jpg"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let dispatcher = NotificationDispatcher::new(Arc::new(NoMail), NotificationSettings::default());
    let images = ImageFetcher::new(Duration::from_secs(5)).unwrap();
    let response = success(vec![
      product(1, "Espresso", 250, format!("{}/espresso.jpg", server.uri())),
      product(2, "Croissant", 220, format!("{}/gone.jpg", server.uri())),
    ]);

    let result = render_discovery(&response, &dispatcher, "seller-1", &images).await;

    assert!(!result.is_error);
    assert_eq!(result.content.len(), 3);
    assert!(matches!(&result.content[0], Content::Text { text } if text.starts_with("🛒 Espresso")));
    assert_eq!(
      result.content[1],
      Content::Image {
        data: "YWJj".into(),
        mime_type: "image/jpeg".into(),
      }
    );
    assert!(matches!(&result.content[2], Content::Text { text } if text.starts_with("🛒 Croissant")));

    let json = serde_json::to_value(&result.content[1]).unwrap();
    assert_eq!(json, json!({"type": "image", "data": "YWJj", "mimeType": "image/jpeg"}));
  }

  #[test]
  fn buy_arguments_accept_legacy_names() {
    let args: BuyProductsArgs =
      serde_json::from_value(json!({"productIDs": [1, 2], "signed_b64_payload": "abc"})).unwrap();
    assert_eq!(args.product_ids, vec![1, 2]);
    assert_eq!(args.signed_payload.as_deref(), Some("abc"));

    let args: BuyProductsArgs = serde_json::from_value(json!({"productIds": [3]})).unwrap();
    assert!(args.signed_payload.is_none());
  }
}
