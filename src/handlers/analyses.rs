//! Analysis handlers

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::PathRejection,
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::models::{AnalysisRecord, InstallDecision, TrendPoint, UploadRequest, UPLOAD_FIELD};

/// Upload an APK and start its analysis
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<AnalysisRecord>> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected upload body: {}", e);
        AppError::MissingFile
    })?;

    let upload = read_upload(&mut multipart, state.config.max_upload_bytes)
        .await?
        .ok_or(AppError::MissingFile)?;
    upload.validate()?;

    let record = state.orchestrator.submit(upload).await?;
    Ok(Json(record))
}

/// List analyses, most recent first
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<AnalysisRecord>>> {
    let mut analyses = state.store.get_all();
    analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(Json(analyses))
}

/// Get single analysis
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<AnalysisRecord>> {
    let record = find(&state, path)?;
    Ok(Json(record))
}

/// Whether the dashboard may offer installation
pub async fn install(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<InstallDecision>> {
    let record = find(&state, path)?;
    Ok(Json(record.install_decision()))
}

/// Threat score series for the trend chart, oldest first
pub async fn trend(State(state): State<AppState>) -> AppResult<Json<Vec<TrendPoint>>> {
    let mut analyses = state.store.get_all();
    analyses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(Json(analyses.iter().map(AnalysisRecord::trend_point).collect()))
}

// Helper functions

fn find(state: &AppState, path: Result<Path<u64>, PathRejection>) -> AppResult<AnalysisRecord> {
    // A non-numeric id can never match a record
    let Path(id) = path.map_err(|_| not_found())?;
    state.store.get(id).ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound("Analysis not found".to_string())
}

/// First `apk` file part of the body. Other parts, and an `apk` part sent
/// as a plain form value (no `filename`), are skipped.
async fn read_upload(
    multipart: &mut Multipart,
    max_file_bytes: usize,
) -> AppResult<Option<UploadRequest>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > max_file_bytes {
            tracing::debug!("Rejected upload {}: {} bytes", filename, bytes.len());
            return Err(AppError::PayloadTooLarge);
        }
        return Ok(Some(UploadRequest::new(&filename, bytes)));
    }

    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::ValidationError(err.body_text())
    }
}
