//! CORS middleware configuration for cross-origin requests.
//!
//! Browser clients call the OTP endpoints directly, so preflight requests
//! must succeed. Development is permissive; production only admits the
//! origins listed in `ALLOWED_ORIGINS`.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use og_shared::{CorsConfig, Environment};

/// Creates a CORS middleware instance configured for the given environment.
pub fn create_cors(environment: Environment, config: &CorsConfig) -> Cors {
    if environment.is_production() {
        create_production_cors(config)
    } else {
        create_development_cors(config)
    }
}

/// Headers sent by browser SDKs of the hosted auth platform
fn allowed_headers() -> Vec<header::HeaderName> {
    vec![
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::HeaderName::from_static("x-client-info"),
        header::HeaderName::from_static("apikey"),
    ]
}

fn exposed_headers() -> Vec<header::HeaderName> {
    vec![
        header::RETRY_AFTER,
        header::HeaderName::from_static("x-request-id"),
    ]
}

/// Any origin, for local clients and emulators.
fn create_development_cors(config: &CorsConfig) -> Cors {
    tracing::info!("Configuring CORS for development environment");

    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(allowed_headers())
        .expose_headers(exposed_headers())
        .max_age(config.max_age)
}

/// Only the configured origins. With none configured, every cross-origin
/// request is refused.
fn create_production_cors(config: &CorsConfig) -> Cors {
    tracing::info!("Configuring CORS for production environment");

    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(allowed_headers())
        .expose_headers(exposed_headers())
        .max_age(config.max_age)
        .block_on_origin_mismatch(true);

    if config.allowed_origins.is_empty() {
        tracing::warn!("ALLOWED_ORIGINS is empty; cross-origin requests will be rejected");
    }

    for origin in &config.allowed_origins {
        tracing::info!(origin = %origin, "Adding allowed origin");
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_development_allows_any_origin() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(Environment::Development, &CorsConfig::default()))
                .route("/", web::post().to(ok)),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "apikey, content-type"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert!(resp
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[actix_web::test]
    async fn test_production_only_allows_configured_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
            max_age: 600,
        };
        let app = test::init_service(
            App::new()
                .wrap(create_cors(Environment::Production, &config))
                .route("/", web::post().to(ok)),
        )
        .await;

        let allowed = test::TestRequest::post()
            .uri("/")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .to_request();
        let resp = test::call_service(&app, allowed).await;
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );

        let foreign = test::TestRequest::post()
            .uri("/")
            .insert_header((header::ORIGIN, "https://evil.example.net"))
            .to_request();
        let status = match test::try_call_service(&app, foreign).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_production_without_origins_refuses_cross_origin_post() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(Environment::Production, &CorsConfig::default()))
                .route("/", web::post().to(ok)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .to_request();
        let status = match test::try_call_service(&app, req).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Same-origin and server-to-server calls carry no Origin header
        let req = test::TestRequest::post().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
