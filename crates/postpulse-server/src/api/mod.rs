mod leaderboard;
mod posts;
mod settings;
mod sync_runs;
mod weeks;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use postpulse_core::PostRecord;
use postpulse_db::PostRow;
use postpulse_sync::{StoreError, SyncError, SyncService};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, require_tenant, AuthState,
    RateLimitState, RequestId, TENANT_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sync: SyncService,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &postpulse_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    tracing::error!(error = %error, "record store query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_sync_error(request_id: String, error: &SyncError) -> ApiError {
    match error {
        SyncError::MissingCredentials => {
            ApiError::new(request_id, "bad_request", error.to_string())
        }
        SyncError::AlreadyRunning { .. } => ApiError::new(request_id, "conflict", error.to_string()),
        SyncError::History(_) | SyncError::PaginationLimit { .. } => {
            tracing::warn!(error = %error, "sync aborted by chat provider");
            ApiError::new(request_id, "bad_gateway", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "sync failed");
            ApiError::new(request_id, "internal_error", "sync failed")
        }
    }
}

pub(super) fn validation_error(request_id: String, error: &impl std::fmt::Display) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

/// Converts stored rows, treating a corrupt row as a server error.
pub(super) fn into_records(
    request_id: &str,
    rows: Vec<PostRow>,
) -> Result<Vec<PostRecord>, ApiError> {
    rows.into_iter()
        .map(PostRow::into_record)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_db_error(request_id.to_owned(), &e))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(TENANT_HEADER),
        ])
}

fn tenant_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/posts", get(posts::list_posts))
        .route("/api/v1/posts/sync", post(posts::sync_posts))
        .route("/api/v1/weeks", get(weeks::list_weeks))
        .route("/api/v1/leaderboard", get(leaderboard::get_leaderboard))
        .route(
            "/api/v1/settings",
            get(settings::list_settings).post(settings::upsert_setting),
        )
        .route("/api/v1/settings/{key}", get(settings::get_setting))
        .route("/api/v1/sync-runs", get(sync_runs::list_sync_runs))
        .layer(axum::middleware::from_fn(require_tenant))
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/weeks/current", get(weeks::current_week))
        .merge(tenant_router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match postpulse_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use postpulse_core::{AppConfig, Environment, TenantId};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    const TENANT: &str = "tenant-test-0001";

    fn test_config(database_url: &str) -> AppConfig {
        AppConfig {
            database_url: database_url.to_string(),
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            db_max_connections: 2,
            db_min_connections: 0,
            db_acquire_timeout_secs: 1,
            discord_api_base: "http://127.0.0.1:9".to_string(),
            discord_timeout_secs: 1,
            fxtwitter_api_base: "http://127.0.0.1:9".to_string(),
            lookup_timeout_secs: 1,
            lookup_max_retries: 0,
            lookup_backoff_ms: 0,
            sync_max_concurrent_lookups: 2,
            user_agent: "postpulse-test".to_string(),
            api_keys: Vec::new(),
        }
    }

    fn app_with_pool(pool: PgPool, auth: AuthState) -> Router {
        let sync = SyncService::new(pool.clone(), &test_config("postgres://unused"))
            .expect("sync service");
        build_app(AppState { pool, sync }, auth, default_rate_limit_state())
    }

    /// App over a pool that never connects; only for routes that do not touch the database.
    fn offline_app(auth: AuthState) -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@127.0.0.1:1/none")
            .expect("lazy pool");
        app_with_pool(pool, auth)
    }

    fn open_auth() -> AuthState {
        AuthState::new(&[], true).expect("auth")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn sync_errors_map_to_distinct_statuses() {
        let status = |e: SyncError| map_sync_error("r".into(), &e).into_response().status();

        assert_eq!(status(SyncError::MissingCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(SyncError::AlreadyRunning {
                channel_id: "1".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(SyncError::PaginationLimit { max_pages: 1 }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(SyncError::Db(postpulse_db::DbError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn current_week_for_index_zero() {
        let response = offline_app(open_auth())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/weeks/current?week=0")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["data"]["week_index"], 0);
        assert_eq!(json["data"]["week_label"], "Jan 5 - Jan 12");
        assert_eq!(json["data"]["start"], "2024-01-05T03:00:00Z");
    }

    #[tokio::test]
    async fn tenant_routes_reject_missing_user_id() {
        let response = offline_app(open_auth())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/posts")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn tenant_routes_reject_malformed_user_id() {
        let response = offline_app(open_auth())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/settings")
                    .header(TENANT_HEADER, "short")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_require_bearer_when_keys_configured() {
        let auth = AuthState::new(&["secret-key".to_string()], false).expect("auth");
        let app = offline_app(auth);

        let denied = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/weeks/current")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/weeks/current")
                    .header("authorization", "Bearer secret-key")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_sort_is_a_validation_error() {
        let response = offline_app(open_auth())
            .oneshot(
                Request::builder()
                    .uri("/api/v1/posts?week=1&sort_by=shares")
                    .header(TENANT_HEADER, TENANT)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    // -------------------------------------------------------------------------
    // Routes backed by the database
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn sync_without_credentials_is_bad_request(pool: PgPool) {
        let response = app_with_pool(pool, open_auth())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/posts/sync")
                    .header(TENANT_HEADER, TENANT)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["error"]["message"],
            "Discord credentials not fully configured"
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn settings_are_masked_and_scoped(pool: PgPool) {
        let tenant = TenantId::parse(TENANT).unwrap();
        postpulse_db::upsert_setting(&pool, &tenant, "discord_token", "bot-secret")
            .await
            .expect("upsert");

        let app = app_with_pool(pool, open_auth());
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/settings/discord_token")
                    .header(TENANT_HEADER, TENANT)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["value"], postpulse_core::MASKED_VALUE);

        let other_tenant = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/settings/discord_token")
                    .header(TENANT_HEADER, "tenant-test-0002")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(other_tenant.status(), StatusCode::NOT_FOUND);
    }
}
