//! Mapping of gate errors onto HTTP responses

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::{header, StatusCode};
use actix_web::{HttpRequest, HttpResponse};
use og_core::OtpError;
use og_shared::{error_codes, ApiResponse, ErrorDetail};
use validator::ValidationErrors;

use super::{request_id, REQUEST_ID_HEADER};

/// Message returned for store failures; the cause stays in the logs
const STORE_UNAVAILABLE_MESSAGE: &str = "Unable to process OTP requests right now, please try again later";

/// HTTP status for each gate error
pub fn status_for(error: &OtpError) -> StatusCode {
    match error {
        OtpError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        OtpError::RateLimited { .. } | OtpError::QuotaExceeded { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        OtpError::VerificationFailed { .. } => StatusCode::BAD_REQUEST,
        OtpError::Provider { .. } => StatusCode::BAD_GATEWAY,
        OtpError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the error envelope for a gate error
///
/// Rate-limit rejections also carry a `Retry-After` header with the same
/// value as `error.retry_after`.
pub fn to_error_response(error: &OtpError, request_id: &str) -> HttpResponse {
    let message = match error {
        OtpError::Store { .. } => STORE_UNAVAILABLE_MESSAGE.to_string(),
        other => other.to_string(),
    };

    let mut detail = ErrorDetail::new(error.code(), message);
    if let Some(seconds) = error.retry_after_seconds() {
        detail = detail.with_retry_after(seconds);
    }
    if let Some(limit) = error.limit() {
        detail = detail.with_limit(limit);
    }

    let mut builder = HttpResponse::build(status_for(error));
    builder.insert_header((REQUEST_ID_HEADER, request_id.to_string()));
    if let Some(seconds) = error.retry_after_seconds() {
        builder.insert_header((header::RETRY_AFTER, seconds.to_string()));
    }
    builder.json(ApiResponse::<()>::error(detail).with_request_id(request_id))
}

/// Build an error envelope that does not come from the gate
pub fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
    request_id: &str,
) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((REQUEST_ID_HEADER, request_id.to_string()))
        .json(ApiResponse::<()>::error(ErrorDetail::new(code, message)).with_request_id(request_id))
}

/// Turn DTO validation failures into an `InvalidInput` error for the first
/// offending field
pub fn validation_error(errors: &ValidationErrors) -> OtpError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by_key(|(field, _)| **field);

    match fields.first() {
        Some((field, errors)) => {
            let message = errors
                .first()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .unwrap_or_else(|| "is invalid".to_string());
            OtpError::InvalidInput {
                field: field.to_string(),
                message,
            }
        }
        None => OtpError::InvalidInput {
            field: "body".to_string(),
            message: "Request body is invalid".to_string(),
        },
    }
}

/// `JsonConfig` error handler: malformed or mistyped bodies become 400
/// `INVALID_INPUT` envelopes
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let request_id = request_id(req);
    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        JsonPayloadError::Overflow { limit } | JsonPayloadError::OverflowKnownLength { limit, .. } => {
            format!("Request body exceeds {} bytes", limit)
        }
        other => format!("Invalid request body: {}", other),
    };

    tracing::debug!(request_id = %request_id, error = %err, "Rejected request body");

    let response = error_response(
        StatusCode::BAD_REQUEST,
        error_codes::INVALID_INPUT,
        message,
        &request_id,
    );
    InternalError::from_response(err, response).into()
}
