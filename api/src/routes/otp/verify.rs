use actix_web::{web, HttpRequest, HttpResponse};
use og_shared::phone::mask_phone_number;
use og_shared::ApiResponse;
use validator::Validate;

use crate::app::AppState;
use crate::dto::otp::{VerifyOtpRequest, VerifyOtpResponse};
use crate::handlers::{request_id, to_error_response, validation_error, REQUEST_ID_HEADER};

/// Handler for POST /api/v1/otp/verify
///
/// Accepts `{"phone", "otp"}` or the `{"mobile", "token"}` spelling and
/// forwards the pair to the provider. The provider's session is returned
/// untouched on success; a rejected code is a 400 `VERIFICATION_FAILED`.
pub async fn verify_otp(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse {
    let request_id = request_id(&req);
    let request = request.into_inner();

    tracing::info!(
        request_id = %request_id,
        phone = %mask_phone_number(&request.phone),
        "Processing verify OTP request"
    );

    if let Err(errors) = request.validate() {
        let error = validation_error(&errors);
        return to_error_response(&error, &request_id);
    }

    match state.gate.verify_otp(&request.phone, &request.otp).await {
        Ok(outcome) => HttpResponse::Ok()
            .insert_header((REQUEST_ID_HEADER, request_id.clone()))
            .json(ApiResponse::success(VerifyOtpResponse::from(outcome)).with_request_id(request_id)),
        Err(error) => to_error_response(&error, &request_id),
    }
}
