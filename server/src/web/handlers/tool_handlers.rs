// server/src/web/handlers/tool_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use paygate::discovery::DiscoveryStatus;
use paygate::error::ErrorKind;
use paygate::purchase::PurchaseStatus;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::errors::{status_for_kind, AppError};
use crate::state::AppState;
use crate::web::tools::{self, BuyProductsArgs, FindProductsArgs, ToolCall, ToolResult};

fn discovery_status(status: DiscoveryStatus, kind: Option<ErrorKind>) -> StatusCode {
  match status {
    DiscoveryStatus::Success | DiscoveryStatus::NoMatch => StatusCode::OK,
    DiscoveryStatus::Error => status_for_kind(kind.unwrap_or(ErrorKind::Internal)),
  }
}

fn purchase_status(status: PurchaseStatus, kind: Option<ErrorKind>) -> StatusCode {
  match status {
    PurchaseStatus::Success => StatusCode::OK,
    PurchaseStatus::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
    PurchaseStatus::Error => status_for_kind(kind.unwrap_or(ErrorKind::Internal)),
  }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, AppError> {
  serde_json::from_value(arguments).map_err(|e| AppError::Validation(format!("Invalid arguments for '{}': {}", tool, e)))
}

pub async fn list_tools_handler() -> HttpResponse {
  HttpResponse::Ok().json(tools::descriptors())
}

#[instrument(name = "handler::find_products", skip_all)]
pub async fn find_products_handler(
  app_state: web::Data<AppState>,
  req: web::Json<FindProductsArgs>,
) -> HttpResponse {
  let response = app_state.discovery.find_products(&req.input_text).await;
  info!(status = ?response.status, products = response.products.len(), "Discovery answered.");
  HttpResponse::build(discovery_status(response.status, response.error_kind)).json(response)
}

#[instrument(name = "handler::buy_products", skip_all, fields(items = req.product_ids.len()))]
pub async fn buy_products_handler(
  app_state: web::Data<AppState>,
  req: web::Json<BuyProductsArgs>,
) -> HttpResponse {
  let req = req.into_inner();
  let response = app_state
    .purchases
    .buy_products(&req.product_ids, req.signed_payload.as_deref())
    .await;
  info!(status = ?response.status, "Purchase answered.");
  HttpResponse::build(purchase_status(response.status, response.error_kind)).json(response)
}

/// Generic tool dispatch. Domain outcomes, including failures, come back as
/// `200` with text and image content; only an unknown tool or bad arguments are HTTP
/// errors.
#[instrument(name = "handler::call_tool", skip_all, fields(tool = %call.name))]
pub async fn call_tool_handler(
  app_state: web::Data<AppState>,
  call: web::Json<ToolCall>,
) -> Result<HttpResponse, AppError> {
  let ToolCall { name, arguments } = call.into_inner();
  let result: ToolResult = match name.as_str() {
    tools::FIND_PRODUCTS => {
      let args: FindProductsArgs = parse_arguments(&name, arguments)?;
      let response = app_state.discovery.find_products(&args.input_text).await;
      tools::render_discovery(
        &response,
        &app_state.dispatcher,
        &app_state.seller_address,
        &app_state.images,
      )
      .await
    }
    tools::BUY_PRODUCTS => {
      let args: BuyProductsArgs = parse_arguments(&name, arguments)?;
      let response = app_state
        .purchases
        .buy_products(&args.product_ids, args.signed_payload.as_deref())
        .await;
      tools::render_purchase(&response)
    }
    other => {
      warn!(tool = other, "Unknown tool requested.");
      return Err(AppError::NotFound(format!("Tool '{}' not found", other)));
    }
  };
  Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
  use crate::services::ImageFetcher;
  use crate::state::AppState;
  use crate::web::configure_app_routes;
  use actix_web::{http::StatusCode, test, web, App};
  use async_trait::async_trait;
  use paygate::catalog::CatalogGateway;
  use paygate::error::Result;
  use paygate::facilitator::PaymentFacilitator;
  use paygate::models::{CategoryCandidate, PaymentProof, PaymentQuote, PaymentVerdict, Product, Wallet};
  use paygate::notify::{EmailMessage, NotificationSink};
  use paygate::oracle::{Oracle, OracleReply, OracleRequest};
  use paygate::settings::{DiscoverySettings, NotificationSettings, PurchaseSettings};
  use paygate::{DiscoveryFunnel, InMemoryLedger, NotificationDispatcher, PurchaseOrchestrator};
  use serde_json::{json, Value};
  use std::sync::Arc;
  use std::time::Duration;
  use uuid::Uuid;

  const SELLER: &str = "seller-address";

  struct OneCategoryCatalog;

  #[async_trait]
  impl CatalogGateway for OneCategoryCatalog {
    async fn categories(&self) -> Result<Vec<CategoryCandidate>> {
      Ok(vec![CategoryCandidate {
        id: 1,
        name: "Coffee".into(),
      }])
    }

    async fn category_products(&self, _category_id: i64) -> Result<Vec<Product>> {
      Ok(vec![espresso()])
    }
  }

  /// Picks category 1, then product 1.
  struct AlwaysFirst;

  #[async_trait]
  impl Oracle for AlwaysFirst {
    async fn complete(&self, _request: &OracleRequest) -> Result<OracleReply> {
      Ok(OracleReply::structured(vec![1]))
    }
  }

  /// Approves the payload "paid" and rejects everything else.
  struct PaidOnly;

  #[async_trait]
  impl PaymentFacilitator for PaidOnly {
    async fn verify(&self, quote: &PaymentQuote) -> Result<PaymentVerdict> {
      match quote.payload() {
        Some("paid") => Ok(PaymentVerdict::Approved {
          proof: PaymentProof::new(format!("tx-{}", Uuid::new_v4())),
        }),
        _ => Ok(PaymentVerdict::rejected("not paid")),
      }
    }
  }

  struct NoMail;

  #[async_trait]
  impl NotificationSink for NoMail {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
      Ok(())
    }
  }

  fn espresso() -> Product {
    Product {
      id: 1,
      name: "Espresso".into(),
      price: 250,
      image: String::new(),
    }
  }

  fn app_state() -> AppState {
    let wallet_id = Uuid::new_v4();
    let ledger = InMemoryLedger::new()
      .with_wallet(Wallet {
        id: wallet_id,
        credit: 1_000,
        name: None,
        email: None,
      })
      .with_products([espresso()]);
    let dispatcher = Arc::new(NotificationDispatcher::new(Arc::new(NoMail), NotificationSettings::default()));
    AppState {
      discovery: Arc::new(DiscoveryFunnel::new(
        Arc::new(OneCategoryCatalog),
        Arc::new(AlwaysFirst),
        DiscoverySettings::default(),
      )),
      purchases: Arc::new(PurchaseOrchestrator::new(
        Arc::new(ledger),
        Arc::new(PaidOnly),
        dispatcher.clone(),
        PurchaseSettings {
          wallet_id,
          seller_address: SELLER.into(),
        },
      )),
      dispatcher,
      seller_address: Arc::from(SELLER),
      images: Arc::new(ImageFetcher::new(Duration::from_secs(5)).unwrap()),
    }
  }

  macro_rules! app {
    () => {
      test::init_service(
        App::new()
          .app_data(web::Data::new(app_state()))
          .configure(configure_app_routes),
      )
      .await
    };
  }

  #[actix_web::test]
  async fn health_and_tool_listing() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/tools").to_request()).await;
    let names: Vec<_> = body["tools"]
      .as_array()
      .unwrap()
      .iter()
      .map(|t| t["name"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(names, vec!["find_products", "buy_products"]);
  }

  #[actix_web::test]
  async fn find_products_returns_matches() {
    let app = app!();
    let req = test::TestRequest::post()
      .uri("/api/v1/tools/find_products")
      .set_json(json!({"inputText": "coffee"}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["products"][0]["name"], "Espresso");
  }

  #[actix_web::test]
  async fn blank_search_is_a_bad_request() {
    let app = app!();
    let req = test::TestRequest::post()
      .uri("/api/v1/tools/find_products")
      .set_json(json!({"inputText": "  "}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[actix_web::test]
  async fn unpaid_purchase_is_402_with_amount() {
    let app = app!();
    let req = test::TestRequest::post()
      .uri("/api/v1/tools/buy_products")
      .set_json(json!({"productIds": [1]}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "payment_required");
    assert_eq!(body["amountRequired"], 250);
    assert_eq!(body["sellerAddress"], SELLER);
  }

  #[actix_web::test]
  async fn paid_purchase_succeeds_and_unknown_product_is_404() {
    let app = app!();
    let req = test::TestRequest::post()
      .uri("/api/v1/tools/buy_products")
      .set_json(json!({"productIds": [1], "signedPayload": "paid"}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["orderIds"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
      .uri("/api/v1/tools/buy_products")
      .set_json(json!({"productIds": [99], "signedPayload": "paid"}))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[actix_web::test]
  async fn generic_call_renders_text_content() {
    let app = app!();
    let req = test::TestRequest::post()
      .uri("/api/v1/tools/call")
      .set_json(json!({"name": "find_products", "arguments": {"input_text": "coffee"}}))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isError"], false);
    let text = body["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Espresso"));
    assert!(text.contains("Lamports: 250"));

    let req = test::TestRequest::post()
      .uri("/api/v1/tools/call")
      .set_json(json!({"name": "buy_products", "arguments": {"productIDs": [1]}}))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["content"][0]["type"], "text");
    assert!(body["content"][0]["text"].as_str().unwrap().contains("250 lamports"));
  }

  #[actix_web::test]
  async fn generic_call_rejects_unknown_tools_and_bad_arguments() {
    let app = app!();
    let req = test::TestRequest::post()
      .uri("/api/v1/tools/call")
      .set_json(json!({"name": "sell_products", "arguments": {}}))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
      .uri("/api/v1/tools/call")
      .set_json(json!({"name": "buy_products", "arguments": {"productIds": "one"}}))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
  }
}
