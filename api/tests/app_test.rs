//! Integration tests for the application shell: health, 404, body errors

mod common;

use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use og_api::create_app;
use serde_json::Value;

use common::{context, context_with_store, gate_config, UnavailableStore};

#[actix_web::test]
async fn test_health_reports_store() {
    let ctx = context(gate_config(60, 5));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["store"]["backend"], "memory");
    assert_eq!(body["data"]["provider"], "scripted");
}

#[actix_web::test]
async fn test_health_is_unavailable_without_store() {
    let ctx = context_with_store(Arc::new(UnavailableStore), gate_config(60, 5));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "STORE_ERROR");
}

#[actix_web::test]
async fn test_unknown_route_is_json_404() {
    let ctx = context(gate_config(60, 5));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/otp/unknown").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_malformed_json_is_invalid_input() {
    let ctx = context(gate_config(60, 5));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"phone\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(ctx.provider.sent_count(), 0);
}

#[actix_web::test]
async fn test_send_rejects_get() {
    let ctx = context(gate_config(60, 5));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/otp/send").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}
