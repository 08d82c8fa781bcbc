use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use og_shared::{error_codes, ApiResponse, ErrorDetail};
use serde_json::json;

use crate::app::AppState;
use crate::handlers::{request_id, REQUEST_ID_HEADER};

/// Health check endpoint handler
///
/// 200 while the counter store answers, 503 otherwise. The gate fails
/// closed without its store, so a broken store means the service is down.
pub async fn health_check(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let request_id = request_id(&req);
    let store = state.gate.store_backend();

    match state.gate.store_health().await {
        Ok(()) => HttpResponse::Ok()
            .insert_header((REQUEST_ID_HEADER, request_id.clone()))
            .json(
                ApiResponse::success(json!({
                    "status": "healthy",
                    "service": "otp-gate",
                    "version": env!("CARGO_PKG_VERSION"),
                    "environment": state.config.environment.to_string(),
                    "store": { "backend": store, "status": "up" },
                    "provider": state.gate.provider_name(),
                    "checked_at": Utc::now().to_rfc3339(),
                }))
                .with_request_id(request_id),
            ),
        Err(e) => {
            tracing::error!(store = store, error = %e, "Health check failed: counter store unavailable");
            let detail = ErrorDetail::new(
                error_codes::STORE_ERROR,
                format!("Counter store '{}' is unavailable", store),
            );
            HttpResponse::ServiceUnavailable()
                .insert_header((REQUEST_ID_HEADER, request_id.clone()))
                .json(ApiResponse::<()>::error(detail).with_request_id(request_id))
        }
    }
}

