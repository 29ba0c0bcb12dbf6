use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::export::ExportFormat;
use crate::import::ImportReport;
use crate::middleware::{ApiResponse, ApiResult, CurrentActor};
use crate::state::AppState;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

/// POST /customers/process/import - multipart upload of a `.csv` or `.xlsx`
///
/// The upload is buffered in memory for the duration of the request only.
pub async fn import(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ImportReport> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected import body: {}", e);
        ApiError::field(FILE_FIELD, "The file field is required.")
    })?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = match upload {
        Some((name, bytes)) if !bytes.is_empty() => (name, bytes),
        _ => return Err(ApiError::field(FILE_FIELD, "The file field is required.")),
    };

    let report = state.customers().import(&current.actor, &file_name, &bytes).await?;
    let message = report.message();
    Ok(ApiResponse::success(report, message))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// GET /customers/process/export?format=csv|xlsx - attachment download
pub async fn export(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentActor>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = ExportFormat::from_param(query.format.as_deref())
        .ok_or_else(|| ApiError::field("format", "The selected format is invalid."))?;

    let bytes = state.customers().export(&current.actor, format).await?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}
