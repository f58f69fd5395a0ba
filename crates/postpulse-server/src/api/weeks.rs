use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use postpulse_core::{available_weeks, week_boundaries_for_index, week_index};
use postpulse_sync::{PgRecordStore, RecordStore};
use serde::{Deserialize, Serialize};

use crate::middleware::{RequestId, Tenant};

use super::{map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct WeekQuery {
    pub week: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct WeekItem {
    week_index: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    week_label: String,
    is_current: bool,
}

impl WeekItem {
    fn for_index(index: i32, current: i32) -> Self {
        let bounds = week_boundaries_for_index(index);
        Self {
            week_index: index,
            start: bounds.start,
            end: bounds.end,
            week_label: bounds.label,
            is_current: index == current,
        }
    }
}

pub(super) async fn current_week(
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<WeekQuery>,
) -> Json<ApiResponse<WeekItem>> {
    let current = week_index(Utc::now());
    let week = query.week.unwrap_or(current);
    Json(ApiResponse::new(WeekItem::for_index(week, current), req_id.0))
}

pub(super) async fn list_weeks(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
) -> Result<Json<ApiResponse<Vec<WeekItem>>>, ApiError> {
    let stored = PgRecordStore::new(state.pool.clone())
        .list_distinct_week_indexes(&tenant)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let current = week_index(Utc::now());
    let data = available_weeks(current, &stored)
        .into_iter()
        .map(|index| WeekItem::for_index(index, current))
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
