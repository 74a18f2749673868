// server/src/web/routes.rs

use crate::web::handlers::tool_handlers;
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/tools")
          .route("", web::get().to(tool_handlers::list_tools_handler))
          .route("/call", web::post().to(tool_handlers::call_tool_handler))
          .route("/find_products", web::post().to(tool_handlers::find_products_handler))
          .route("/buy_products", web::post().to(tool_handlers::buy_products_handler)),
      ),
  );
}
