use axum::{
    extract::{Path, State},
    Extension, Json,
};
use postpulse_core::Setting;
use serde::Deserialize;

use crate::middleware::{RequestId, Tenant};

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SettingBody {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

pub(super) async fn list_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
) -> Result<Json<ApiResponse<Vec<Setting>>>, ApiError> {
    let rows = postpulse_db::list_settings(&state.pool, &tenant)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| Setting::from(row).masked())
        .collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_setting(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Setting>>, ApiError> {
    let row = postpulse_db::get_setting(&state.pool, &tenant, &key)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("setting '{key}' not found"),
            )
        })?;

    Ok(Json(ApiResponse::new(Setting::from(row).masked(), req_id.0)))
}

pub(super) async fn upsert_setting(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
    Json(body): Json<SettingBody>,
) -> Result<Json<ApiResponse<Setting>>, ApiError> {
    let key = body.key.trim();
    if key.is_empty() {
        return Err(ApiError::new(req_id.0, "bad_request", "key is required"));
    }

    let row = postpulse_db::upsert_setting(&state.pool, &tenant, key, &body.value)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(tenant = %tenant, key, "setting updated");

    Ok(Json(ApiResponse::new(Setting::from(row).masked(), req_id.0)))
}
