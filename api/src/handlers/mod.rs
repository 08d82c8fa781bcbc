//! Request helpers and error response construction shared by the routes

pub mod error;

use actix_web::HttpRequest;
use uuid::Uuid;

pub use error::{error_response, json_error_handler, to_error_response, validation_error};

/// Header carrying the caller's request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID from `X-Request-ID`, or a fresh UUID v4 when absent or unusable
pub fn request_id(req: &HttpRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_request_id_from_header() {
        let req = TestRequest::default()
            .insert_header((REQUEST_ID_HEADER, "abc-123"))
            .to_http_request();
        assert_eq!(request_id(&req), "abc-123");
    }

    #[test]
    fn test_request_id_generated_when_missing() {
        let req = TestRequest::default().to_http_request();
        let id = request_id(&req);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_oversized_request_id_is_replaced() {
        let req = TestRequest::default()
            .insert_header((REQUEST_ID_HEADER, "x".repeat(200)))
            .to_http_request();
        assert_ne!(request_id(&req).len(), 200);
    }
}
