pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::ScanConfig;
use crate::services::scan_manager::MediaScanManager;
use crate::services::scanner::AvScanner;
use axum::{
    Router,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::scans::scan_media,
        api::handlers::scans::scan_encrypted,
        api::handlers::scans::clear_scans,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::scans::MediaScanResponse,
            api::handlers::scans::ScanEncryptedRequest,
            api::handlers::scans::ClearScansResponse,
            api::handlers::health::HealthResponse,
            entities::media_scans::ScanStatus,
            services::scanner::EncryptedFile,
        )
    ),
    tags(
        (name = "scans", description = "Media scan status lookups"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub scanner: Arc<dyn AvScanner>,
    pub scan_manager: Arc<MediaScanManager>,
    pub config: ScanConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/scan/:server_name/:media_id",
            get(api::handlers::scans::scan_media),
        )
        .route("/scan_encrypted", post(api::handlers::scans::scan_encrypted))
        .route("/scans", delete(api::handlers::scans::clear_scans))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
