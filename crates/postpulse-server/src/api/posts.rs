use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use postpulse_core::{week_index, PostRecord, PostSort, SortOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{RequestId, Tenant};

use super::{
    into_records, map_db_error, map_sync_error, validation_error, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct PostsQuery {
    pub week: Option<i32>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncResponse {
    message: &'static str,
    count: usize,
    sync_run_id: Uuid,
}

pub(super) async fn sync_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
) -> Result<Json<ApiResponse<SyncResponse>>, ApiError> {
    let report = state
        .sync
        .run(&tenant, "api")
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    let data = SyncResponse {
        message: "Sync successful",
        count: report.outcome.synced_count,
        sync_run_id: report.run_public_id,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<Vec<PostRecord>>>, ApiError> {
    let sort = query
        .sort_by
        .as_deref()
        .map(str::parse::<PostSort>)
        .transpose()
        .map_err(|e| validation_error(req_id.0.clone(), &e))?
        .unwrap_or_default();
    let order = query
        .order
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()
        .map_err(|e| validation_error(req_id.0.clone(), &e))?
        .unwrap_or_default();
    let week = query.week.unwrap_or_else(|| week_index(Utc::now()));

    let rows = postpulse_db::list_posts_for_week(&state.pool, &tenant, week, sort, order)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let data = into_records(&req_id.0, rows)?;

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
