use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

use crate::errors::{AppError, AppResult};
use crate::models::DownloadRequest;
use crate::services::ProxiedDownload;
use crate::web::{AppState, responses::handle_text_error};

/// `GET /api/download?url=&filename=&referer=`
///
/// Streams the upstream body as an attachment. Failures are plain text and
/// never carry upstream bytes.
pub async fn download_media(
    State(state): State<AppState>,
    Query(request): Query<DownloadRequest>,
) -> Response {
    let result = match state.download.start(&request).await {
        Ok(download) => into_response(download),
        Err(error) => Err(error),
    };
    result.unwrap_or_else(handle_text_error)
}

fn into_response(download: ProxiedDownload) -> AppResult<Response> {
    let content_type = HeaderValue::from_str(&download.content_type)
        .map_err(|e| AppError::internal(format!("invalid content type header: {e}")))?;
    let disposition = HeaderValue::from_str(&download.content_disposition)
        .map_err(|e| AppError::internal(format!("invalid content disposition header: {e}")))?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition);
    if let Some(length) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(download.body))
        .map_err(|e| AppError::internal(format!("failed to build download response: {e}")))
}
