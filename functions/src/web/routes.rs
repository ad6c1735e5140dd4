// nueats/functions/src/web/routes.rs

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{auto_ready_handlers, notification_handlers, payment_handlers, webhook_handlers};

pub const FUNCTIONS_PREFIX: &str = "/functions/v1";

/// Permissive CORS headers added to every response; browsers call these
/// functions straight from the ordering app.
pub fn cors_headers() -> DefaultHeaders {
  DefaultHeaders::new()
    .add(("Access-Control-Allow-Origin", "*"))
    .add((
      "Access-Control-Allow-Headers",
      "authorization, x-client-info, apikey, content-type, paymongo-signature",
    ))
    .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
}

pub async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn preflight_handler() -> HttpResponse {
  HttpResponse::NoContent().finish()
}

async fn method_not_allowed_handler() -> Result<HttpResponse, AppError> {
  Err(AppError::MethodNotAllowed)
}

/// A resource that answers `OPTIONS` with 204 and anything unrouted with 405.
fn function_resource(path: &str) -> actix_web::Resource {
  web::resource(path)
    .route(web::method(Method::OPTIONS).to(preflight_handler))
    .default_service(web::route().to(method_not_allowed_handler))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope(FUNCTIONS_PREFIX)
      .service(function_resource("/health").route(web::get().to(health_check_handler)))
      .service(
        function_resource("/auto-ready-orders").route(web::post().to(auto_ready_handlers::auto_ready_orders_handler)),
      )
      .service(
        function_resource("/payment")
          .route(web::post().to(payment_handlers::initiate_payment_handler))
          .route(web::get().to(payment_handlers::payment_redirect_handler)),
      )
      .service(
        function_resource("/payment-webhook").route(web::post().to(webhook_handlers::payment_webhook_handler)),
      )
      .service(
        function_resource("/send-order-email").route(web::post().to(notification_handlers::send_order_email_handler)),
      ),
  );
}
