// tests/http_tests.rs
mod common;

use actix_web::http::{Method, StatusCode};
use actix_web::{test, web, App};
use common::{at, gateway_session, item, menu_item, order, test_app};
use nueats_functions::models::{OrderStatus, PaymentStatus};
use nueats_functions::web::{configure_app_routes, cors_headers};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .wrap(cors_headers())
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_web::test]
#[serial]
async fn preflight_gets_cors_headers_and_no_body() {
  let app = test_app();
  let svc = init_app!(app.state);

  for path in ["/functions/v1/payment", "/functions/v1/payment-webhook", "/functions/v1/send-order-email"] {
    let req = test::TestRequest::default().method(Method::OPTIONS).uri(path).to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{}", path);
    assert_eq!(
      resp.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
      Some("*")
    );
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
  }
}

#[actix_web::test]
#[serial]
async fn wrong_method_is_405() {
  let app = test_app();
  let svc = init_app!(app.state);

  for (method, path) in [
    (Method::GET, "/functions/v1/auto-ready-orders"),
    (Method::GET, "/functions/v1/payment-webhook"),
    (Method::PUT, "/functions/v1/payment"),
    (Method::DELETE, "/functions/v1/send-order-email"),
  ] {
    let req = test::TestRequest::default().method(method).uri(path).to_request();
    let resp = test::call_service(&svc, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", path);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Method not allowed");
  }
}

#[actix_web::test]
#[serial]
async fn health_reports_ok() {
  let app = test_app();
  let svc = init_app!(app.state);

  let req = test::TestRequest::get().uri("/functions/v1/health").to_request();
  let body: Value = test::call_and_read_body_json(&svc, req).await;
  assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_web::test]
#[serial]
async fn auto_ready_endpoint_reports_promoted_orders() {
  let app = test_app();
  let user = Uuid::new_v4();
  app.store.with(|d| {
    // Created long enough ago that the 15 minute prep time has passed.
    d.orders.push(order(83, user, OrderStatus::Preparing, at("2024-01-01T12:00:00Z"), dec!(120)));
    d.items.push(item(1, 83, 7, 1, dec!(120)));
    d.menu.push(menu_item(7, "Chicken Adobo", dec!(120), Some(15)));
    d.emails.insert(user, "eve@student.test".to_string());
  });
  let svc = init_app!(app.state);

  let req = test::TestRequest::post().uri("/functions/v1/auto-ready-orders").to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["updatedOrders"], 1);
  assert_eq!(body["orderIds"], json!([83]));
}

#[actix_web::test]
#[serial]
async fn auto_ready_fetch_failure_is_500() {
  let app = test_app();
  app.store.with(|d| d.fail_order_reads = true);
  let svc = init_app!(app.state);

  let req = test::TestRequest::post().uri("/functions/v1/auto-ready-orders").to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Database operation failed");
}

#[actix_web::test]
#[serial]
async fn payment_initiation_over_http() {
  let app = test_app();
  let svc = init_app!(app.state);
  let user = Uuid::new_v4();

  let req = test::TestRequest::post()
    .uri("/functions/v1/payment")
    .set_json(json!({ "amount": 250, "payment_method_type": "gateway", "order_id": 83, "user_id": user }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "success");
  assert!(body["payment_session_id"].is_string());
  assert_eq!(body["redirect_url"], "https://checkout.example/cs_test_1");

  let req = test::TestRequest::post()
    .uri("/functions/v1/payment")
    .set_json(json!({ "amount": 0, "payment_method_type": "cash", "user_id": user }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("amount"));
}

#[actix_web::test]
#[serial]
async fn redirect_page_always_renders() {
  let app = test_app();
  app.store.with(|d| d.fail_session_reads = true);
  let svc = init_app!(app.state);

  let req = test::TestRequest::get()
    .uri("/functions/v1/payment?redirect=success&session_id=cs_9")
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let content_type = resp.headers().get("content-type").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
  assert!(content_type.starts_with("text/html"));
  let body = test::read_body(resp).await;
  assert!(String::from_utf8_lossy(&body).contains("Payment successful"));
}

#[actix_web::test]
#[serial]
async fn webhook_endpoint_acknowledges_and_fails_loudly() {
  let app = test_app();
  app.store.with(|d| d.sessions.push(gateway_session("cs_123", PaymentStatus::Pending)));
  let svc = init_app!(app.state);

  let event = json!({ "data": { "attributes": {
    "type": "checkout_session.payment.paid",
    "data": { "id": "cs_123", "attributes": {} }
  } } });
  let req = test::TestRequest::post()
    .uri("/functions/v1/payment-webhook")
    .set_json(&event)
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["message"].as_str().unwrap().starts_with("Webhook processed"));
  assert_eq!(app.store.session_status("cs_123"), Some(PaymentStatus::Success));

  let req = test::TestRequest::post()
    .uri("/functions/v1/payment-webhook")
    .set_payload("garbage")
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(app.store.webhook_logs().len(), 2);
}

#[actix_web::test]
#[serial]
async fn notification_without_fields_is_500() {
  let app = test_app();
  let svc = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/functions/v1/send-order-email")
    .set_json(json!({ "orderId": 90 }))
    .to_request();
  let resp = test::call_service(&svc, req).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "error": "Missing required fields" }));
}

#[actix_web::test]
#[serial]
async fn notification_reports_pdf_attachment() {
  let app = test_app();
  let user = Uuid::new_v4();
  app.store.with(|d| {
    d.orders.push(order(90, user, OrderStatus::Completed, at("2024-01-01T12:00:00Z"), dec!(250)));
    d.items.push(item(1, 90, 7, 2, dec!(125)));
    d.menu.push(menu_item(7, "Kare-kare", dec!(125), Some(20)));
    d.emails.insert(user, "fay@student.test".to_string());
  });
  let svc = init_app!(app.state);

  let req = test::TestRequest::post()
    .uri("/functions/v1/send-order-email")
    .set_json(json!({ "orderId": 90, "newStatus": "Completed" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&svc, req).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["pdfAttached"], true);
}
