use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use tracing::instrument;

use tf_common::api::{MatchPage, MatchQuery};

use crate::error::ApiError;
use crate::SharedState;

#[instrument(skip(state, query))]
pub async fn list_matches(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> Result<Json<MatchPage>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let page = state.matching.get_matches(&project_id, &query).await?;
    Ok(Json(page))
}
