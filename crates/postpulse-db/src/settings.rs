//! Database operations for the per-tenant `settings` table.

use chrono::{DateTime, Utc};
use postpulse_core::{Setting, TenantId};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingRow> for Setting {
    fn from(row: SettingRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            updated_at: row.updated_at,
        }
    }
}

/// Fetches one setting by key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_setting(
    pool: &PgPool,
    tenant: &TenantId,
    key: &str,
) -> Result<Option<SettingRow>, DbError> {
    let row = sqlx::query_as::<_, SettingRow>(
        "SELECT id, key, value, created_at, updated_at \
         FROM settings WHERE tenant_id = $1 AND key = $2",
    )
    .bind(tenant.as_str())
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists all settings of a tenant ordered by key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_settings(pool: &PgPool, tenant: &TenantId) -> Result<Vec<SettingRow>, DbError> {
    let rows = sqlx::query_as::<_, SettingRow>(
        "SELECT id, key, value, created_at, updated_at \
         FROM settings WHERE tenant_id = $1 ORDER BY key",
    )
    .bind(tenant.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts or replaces the value stored under `key`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_setting(
    pool: &PgPool,
    tenant: &TenantId,
    key: &str,
    value: &str,
) -> Result<SettingRow, DbError> {
    let row = sqlx::query_as::<_, SettingRow>(
        "INSERT INTO settings (tenant_id, key, value) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (tenant_id, key) DO UPDATE SET \
             value      = EXCLUDED.value, \
             updated_at = NOW() \
         RETURNING id, key, value, created_at, updated_at",
    )
    .bind(tenant.as_str())
    .bind(key)
    .bind(value)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
