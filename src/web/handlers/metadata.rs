use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use super::UrlQuery;
use crate::models::PageMetadata;
use crate::web::{AppState, responses::handle_error};

/// `GET /api/og?url=`
pub async fn page_metadata(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Response {
    match state.metadata.lookup(&query.url).await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(error) if error.is_soft() => Json(PageMetadata::failure(error.to_string())).into_response(),
        Err(error) => handle_error(error),
    }
}
