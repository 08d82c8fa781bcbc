use actix_web::{web, HttpRequest, HttpResponse};
use og_shared::phone::mask_phone_number;
use og_shared::ApiResponse;
use validator::Validate;

use crate::app::AppState;
use crate::dto::otp::{SendOtpRequest, SendOtpResponse};
use crate::handlers::{request_id, to_error_response, validation_error, REQUEST_ID_HEADER};

/// Handler for POST /api/v1/otp/send
///
/// Runs the request through the gate: validation, cooldown, hourly quota,
/// provider dispatch and the atomic commit.
///
/// # Request Body
///
/// ```json
/// { "phone": "+919876543210" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "success": true,
///     "data": {
///         "message": "OTP sent successfully",
///         "phone": "+919876543210",
///         "request_count": 1,
///         "remaining_this_hour": 4,
///         "resend_after": 60,
///         "next_request_at": "2024-03-01T10:01:00Z",
///         "hour_bucket": "2024-03-01T10",
///         "provider": "hosted"
///     },
///     "timestamp": "2024-03-01T10:00:00Z",
///     "request_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// ## Errors
/// - 400 `INVALID_INPUT`
/// - 429 `RATE_LIMITED` / `QUOTA_EXCEEDED` with `Retry-After`
/// - 502 `PROVIDER_ERROR`
/// - 500 `STORE_ERROR`
pub async fn send_otp(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<SendOtpRequest>,
) -> HttpResponse {
    let request_id = request_id(&req);
    let request = request.into_inner();

    tracing::info!(
        request_id = %request_id,
        phone = %mask_phone_number(&request.phone),
        "Processing send OTP request"
    );

    if let Err(errors) = request.validate() {
        let error = validation_error(&errors);
        tracing::warn!(request_id = %request_id, error = %error, "Send OTP request failed validation");
        return to_error_response(&error, &request_id);
    }

    match state.gate.request_otp(&request.phone).await {
        Ok(receipt) => {
            let response = SendOtpResponse::from_receipt(receipt, state.gate.config().cooldown.as_secs());
            HttpResponse::Ok()
                .insert_header((REQUEST_ID_HEADER, request_id.clone()))
                .json(ApiResponse::success(response).with_request_id(request_id))
        }
        Err(error) => {
            tracing::info!(
                request_id = %request_id,
                code = error.code(),
                "Send OTP request rejected"
            );
            to_error_response(&error, &request_id)
        }
    }
}
