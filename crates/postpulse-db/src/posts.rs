//! Database operations for the `posts` table.
//!
//! Every query is scoped to a tenant. Counts are `u64` in the domain and
//! `BIGINT` in Postgres; values above `i64::MAX` saturate on write.

use chrono::{DateTime, Utc};
use postpulse_core::{
    EngagementUpdate, MediaType, NewPost, PostRecord, PostSort, SortOrder, TenantId,
};
use sqlx::PgPool;

use crate::DbError;

const POST_COLUMNS: &str = "id, source_message_id, url, post_id, author, content, media_type, \
                            view_count, like_count, posted_at, collected_at, week_index";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `posts` table, as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub source_message_id: String,
    pub url: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub media_type: String,
    pub view_count: i64,
    pub like_count: i64,
    pub posted_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub week_index: i32,
}

impl PostRow {
    /// Converts the stored row into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRow`] for an unknown media type or a negative count.
    pub fn into_record(self) -> Result<PostRecord, DbError> {
        let corrupt = |reason: String| DbError::CorruptRow {
            table: "posts",
            id: self.id,
            reason,
        };

        let media_type = self
            .media_type
            .parse::<MediaType>()
            .map_err(|e| corrupt(e.to_string()))?;
        let view_count = u64::try_from(self.view_count)
            .map_err(|_| corrupt(format!("negative view_count {}", self.view_count)))?;
        let like_count = u64::try_from(self.like_count)
            .map_err(|_| corrupt(format!("negative like_count {}", self.like_count)))?;

        Ok(PostRecord {
            id: self.id,
            source_message_id: self.source_message_id,
            url: self.url,
            post_id: self.post_id,
            author: self.author,
            content: self.content,
            media_type,
            view_count,
            like_count,
            posted_at: self.posted_at,
            collected_at: self.collected_at,
            week_index: self.week_index,
        })
    }
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches the post tracked under `url` for `tenant`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_post_by_url(
    pool: &PgPool,
    tenant: &TenantId,
    url: &str,
) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE tenant_id = $1 AND url = $2"
    ))
    .bind(tenant.as_str())
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists the posts of one week, sorted by the requested column.
///
/// Ties break on `id` in the same direction so pagination-free listings are stable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts_for_week(
    pool: &PgPool,
    tenant: &TenantId,
    week_index: i32,
    sort: PostSort,
    order: SortOrder,
) -> Result<Vec<PostRow>, DbError> {
    let column = match sort {
        PostSort::Views => "view_count",
        PostSort::Likes => "like_count",
        PostSort::PostedAt => "posted_at",
    };
    let direction = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE tenant_id = $1 AND week_index = $2 \
         ORDER BY {column} {direction}, id {direction}"
    ))
    .bind(tenant.as_str())
    .bind(week_index)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every week index that has at least one stored post, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_distinct_week_indexes(
    pool: &PgPool,
    tenant: &TenantId,
) -> Result<Vec<i32>, DbError> {
    let weeks = sqlx::query_scalar::<_, i32>(
        "SELECT DISTINCT week_index FROM posts WHERE tenant_id = $1 ORDER BY week_index DESC",
    )
    .bind(tenant.as_str())
    .fetch_all(pool)
    .await?;

    Ok(weeks)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a post unless one already exists for `(tenant, url)`.
///
/// Returns `None` when the URL was already tracked, including when a
/// concurrent writer inserted it first; the caller then updates instead.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a conflict on
/// `source_message_id`.
pub async fn insert_post(
    pool: &PgPool,
    tenant: &TenantId,
    post: &NewPost,
) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "INSERT INTO posts \
             (tenant_id, source_message_id, url, post_id, author, content, media_type, \
              view_count, like_count, posted_at, week_index) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (tenant_id, url) DO NOTHING \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(tenant.as_str())
    .bind(&post.source_message_id)
    .bind(&post.url)
    .bind(&post.post_id)
    .bind(&post.author)
    .bind(&post.content)
    .bind(post.media_type.as_str())
    .bind(to_db_count(post.view_count))
    .bind(to_db_count(post.like_count))
    .bind(post.posted_at)
    .bind(post.week_index)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Refreshes metrics and content of the post tracked under `url`.
///
/// Identity columns, `posted_at`, `collected_at` and `week_index` are left untouched.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no post exists for `(tenant, url)`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_post_engagement(
    pool: &PgPool,
    tenant: &TenantId,
    url: &str,
    update: &EngagementUpdate,
) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "UPDATE posts SET \
             author = $3, content = $4, media_type = $5, \
             view_count = $6, like_count = $7, updated_at = NOW() \
         WHERE tenant_id = $1 AND url = $2 \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(tenant.as_str())
    .bind(url)
    .bind(&update.author)
    .bind(&update.content)
    .bind(update.media_type.as_str())
    .bind(to_db_count(update.view_count))
    .bind(to_db_count(update.like_count))
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Deletes every post whose `week_index` is strictly below `threshold`.
///
/// Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_posts_before_week(
    pool: &PgPool,
    tenant: &TenantId,
    threshold: i32,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM posts WHERE tenant_id = $1 AND week_index < $2")
        .bind(tenant.as_str())
        .bind(threshold)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
