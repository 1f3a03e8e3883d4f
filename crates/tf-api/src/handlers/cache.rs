use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    /// Omit to drop every cached ranking.
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Eager invalidation hook for the CRUD layer: call after writing a project's
/// status or skills (`projectId`) or any developer (empty body).
pub async fn invalidate(
    State(state): State<SharedState>,
    body: Result<Json<InvalidateRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => InvalidateRequest::default(),
        Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
    };

    match request.project_id.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::BadRequest("projectId must not be blank".into())),
        Some(project_id) => state.matching.invalidate_project(project_id),
        None => state.matching.invalidate_developers(),
    }

    Ok(StatusCode::NO_CONTENT)
}
