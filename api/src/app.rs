//! Application state and factory
//!
//! This module holds the shared application state and provides the factory
//! for creating the Actix-web application.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpResponse};

use og_core::OtpGate;
use og_shared::{error_codes, AppConfig};

use crate::handlers::{error_response, json_error_handler, request_id};
use crate::middleware::cors::create_cors;
use crate::routes::health::health_check;
use crate::routes::otp::{send_otp, verify_otp};

/// Application state shared by all workers
pub struct AppState {
    pub gate: Arc<OtpGate>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(gate: Arc<OtpGate>, config: AppConfig) -> Self {
        Self { gate, config }
    }
}

/// Create and configure the application with all dependencies
pub fn create_app(
    app_state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let cors = create_cors(app_state.config.environment, &app_state.config.cors);

    let json_config = web::JsonConfig::default()
        .limit(app_state.config.server.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(app_state)
        .app_data(json_config)
        .wrap(cors)
        .wrap(Logger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/otp")
                    .route("/send", web::post().to(send_otp))
                    .route("/verify", web::post().to(verify_otp)),
            ),
        )
        .default_service(web::route().to(not_found))
}

/// Default 404 handler
async fn not_found(req: HttpRequest) -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        error_codes::NOT_FOUND,
        "The requested resource was not found",
        &request_id(&req),
    )
}
