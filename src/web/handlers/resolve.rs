use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use super::UrlQuery;
use crate::web::{AppState, responses::handle_error};

/// `GET /api/resolve/rednote?url=`
///
/// A page with nothing usable answers 200 with `ok:false`.
pub async fn resolve_post(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Response {
    match state.resolver.resolve(&query.url).await {
        Ok(result) => Json(result).into_response(),
        Err(error) => handle_error(error),
    }
}
