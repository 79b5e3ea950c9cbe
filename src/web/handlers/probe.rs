use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use super::UrlBody;
use crate::errors::AppError;
use crate::web::{AppState, responses::handle_error};

/// `POST /api/head` with `{"url": ...}`
///
/// A gate rejection is a normal 200 answer with `ok:false` and whatever
/// content type and length were observed.
pub async fn probe_url(
    State(state): State<AppState>,
    body: Result<Json<UrlBody>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return handle_error(AppError::invalid_input(rejection.body_text())),
    };
    match state.probe.probe(&body.url).await {
        Ok(result) => Json(result).into_response(),
        Err(error) => handle_error(error),
    }
}
