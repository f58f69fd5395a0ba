use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use postpulse_core::{
    build_leaderboard, week_index, AuthorStats, LeaderboardOptions, LeaderboardSort, MediaType,
    PostSort, SortOrder,
};
use serde::Deserialize;

use crate::middleware::{RequestId, Tenant};

use super::{into_records, map_db_error, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct LeaderboardQuery {
    pub week: Option<i32>,
    pub sort_by: Option<String>,
    pub media_type: Option<String>,
    pub min_views: Option<u64>,
    pub min_avg_views: Option<u64>,
    pub top_n: Option<usize>,
}

impl LeaderboardQuery {
    fn options(&self) -> Result<LeaderboardOptions, postpulse_core::CoreError> {
        let sort = self
            .sort_by
            .as_deref()
            .map(str::parse::<LeaderboardSort>)
            .transpose()?
            .unwrap_or_default();
        // "all" is what clients send for "no filter".
        let media_type = match self.media_type.as_deref() {
            None | Some("" | "all") => None,
            Some(raw) => Some(raw.parse::<MediaType>()?),
        };

        Ok(LeaderboardOptions {
            sort,
            media_type,
            min_views: self.min_views.unwrap_or(0),
            min_avg_views: self.min_avg_views.unwrap_or(0),
            top_n: self.top_n.unwrap_or(0),
        })
    }
}

pub(super) async fn get_leaderboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(Tenant(tenant)): Extension<Tenant>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<AuthorStats>>>, ApiError> {
    let options = query
        .options()
        .map_err(|e| validation_error(req_id.0.clone(), &e))?;
    let week = query.week.unwrap_or_else(|| week_index(Utc::now()));

    let rows = postpulse_db::list_posts_for_week(
        &state.pool,
        &tenant,
        week,
        PostSort::PostedAt,
        SortOrder::Asc,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let posts = into_records(&req_id.0, rows)?;

    Ok(Json(ApiResponse::new(
        build_leaderboard(&posts, &options),
        req_id.0,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_yields_default_options() {
        let options = LeaderboardQuery::default().options().unwrap();
        assert_eq!(options.sort, LeaderboardSort::TotalViews);
        assert_eq!(options.media_type, None);
        assert_eq!(options.top_n, 0);
    }

    #[test]
    fn all_media_type_means_no_filter() {
        let query = LeaderboardQuery {
            media_type: Some("all".to_string()),
            sort_by: Some("avgViews".to_string()),
            top_n: Some(5),
            ..LeaderboardQuery::default()
        };
        let options = query.options().unwrap();
        assert_eq!(options.media_type, None);
        assert_eq!(options.sort, LeaderboardSort::AvgViews);
        assert_eq!(options.top_n, 5);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let bad_sort = LeaderboardQuery {
            sort_by: Some("shares".to_string()),
            ..LeaderboardQuery::default()
        };
        assert!(bad_sort.options().is_err());

        let bad_media = LeaderboardQuery {
            media_type: Some("gif".to_string()),
            ..LeaderboardQuery::default()
        };
        assert!(bad_media.options().is_err());
    }
}
