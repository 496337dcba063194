use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::entities::{ScanStatus, media_scans};
use crate::services::scanner::EncryptedFile;
use crate::utils::mxc::MxcUri;

#[derive(Serialize, ToSchema)]
pub struct MediaScanResponse {
    pub url: String,
    pub scan_status: ScanStatus,
    pub scan_info: Option<String>,
    pub scan_date: Option<DateTime<Utc>>,
}

impl From<media_scans::Model> for MediaScanResponse {
    fn from(model: media_scans::Model) -> Self {
        Self {
            url: model.url,
            scan_status: model.scan_status,
            scan_info: model.scan_info,
            scan_date: model.scan_date,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ScanEncryptedRequest {
    pub file: EncryptedFile,
}

#[derive(Serialize, ToSchema)]
pub struct ClearScansResponse {
    pub cleared: u64,
}

#[utoipa::path(
    get,
    path = "/scan/{server_name}/{media_id}",
    params(
        ("server_name" = String, Path, description = "Homeserver part of the mxc URL"),
        ("media_id" = String, Path, description = "Media id part of the mxc URL"),
    ),
    responses(
        (status = 200, description = "Cached scan status, possibly IN_PROGRESS if a scan was just triggered", body = MediaScanResponse),
        (status = 400, description = "Malformed media identifier"),
    ),
    tag = "scans"
)]
pub async fn scan_media(
    State(state): State<AppState>,
    Path((server_name, media_id)): Path<(String, String)>,
) -> Result<Json<MediaScanResponse>, AppError> {
    let mxc = MxcUri::parse(&format!("mxc://{}/{}", server_name, media_id))
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let scan = state
        .scan_manager
        .scan_unencrypted_media(&mxc.to_string())
        .await?;

    Ok(Json(scan.into()))
}

#[utoipa::path(
    post,
    path = "/scan_encrypted",
    request_body = ScanEncryptedRequest,
    responses(
        (status = 200, description = "Cached scan status for the encrypted media item", body = MediaScanResponse),
        (status = 400, description = "Descriptor url is not a valid mxc URL"),
    ),
    tag = "scans"
)]
pub async fn scan_encrypted(
    State(state): State<AppState>,
    Json(req): Json<ScanEncryptedRequest>,
) -> Result<Json<MediaScanResponse>, AppError> {
    MxcUri::parse(&req.file.url).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let scan = state.scan_manager.scan_encrypted_media(&req.file).await?;

    Ok(Json(scan.into()))
}

#[utoipa::path(
    delete,
    path = "/scans",
    responses(
        (status = 200, description = "All cached verdicts deleted", body = ClearScansResponse),
    ),
    tag = "scans"
)]
pub async fn clear_scans(
    State(state): State<AppState>,
) -> Result<Json<ClearScansResponse>, AppError> {
    let cleared = state.scan_manager.clear_all().await?;
    tracing::info!("Cleared {} cached scan verdicts", cleared);

    Ok(Json(ClearScansResponse { cleared }))
}
