//! Read-only week and leaderboard output.

use std::fmt::Write as _;

use chrono::Utc;
use postpulse_core::{
    available_weeks, build_leaderboard, week_boundaries_for_index, week_index, AuthorStats,
    LeaderboardOptions, PostRecord, PostSort, SortOrder, TenantId,
};
use postpulse_sync::{PgRecordStore, RecordStore};

/// Print every week with stored posts plus the current one.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_weeks(pool: &sqlx::PgPool, tenant: &TenantId) -> anyhow::Result<()> {
    let stored = PgRecordStore::new(pool.clone())
        .list_distinct_week_indexes(tenant)
        .await?;
    let current = week_index(Utc::now());

    println!("{:<8}{:<20}CURRENT", "WEEK", "RANGE");
    for index in available_weeks(current, &stored) {
        let bounds = week_boundaries_for_index(index);
        let marker = if index == current { "*" } else { "" };
        println!("{index:<8}{:<20}{marker}", bounds.label);
    }
    Ok(())
}

/// Print the leaderboard of one week as a markdown table.
///
/// # Errors
///
/// Returns an error if the query fails or a stored post is corrupt.
pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    tenant: &TenantId,
    week: Option<i32>,
    options: &LeaderboardOptions,
) -> anyhow::Result<()> {
    let week = week.unwrap_or_else(|| week_index(Utc::now()));
    let rows =
        postpulse_db::list_posts_for_week(pool, tenant, week, PostSort::PostedAt, SortOrder::Asc)
            .await?;
    let posts = rows
        .into_iter()
        .map(postpulse_db::PostRow::into_record)
        .collect::<Result<Vec<PostRecord>, _>>()?;

    let stats = build_leaderboard(&posts, options);
    print!("{}", render_markdown(week, &stats));
    Ok(())
}

fn render_markdown(week: i32, stats: &[AuthorStats]) -> String {
    let bounds = week_boundaries_for_index(week);
    let mut out = String::new();
    let _ = writeln!(out, "# Leaderboard: week {week} ({})", bounds.label);
    let _ = writeln!(out);

    if stats.is_empty() {
        let _ = writeln!(out, "_No posts this week._");
        return out;
    }

    let _ = writeln!(out, "| Rank | Author | Posts | Views | Likes | Avg views |");
    let _ = writeln!(out, "|-----:|--------|------:|------:|------:|----------:|");
    for s in stats {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            s.rank,
            s.username.replace('|', "\\|"),
            s.post_count,
            s.total_views,
            s.total_likes,
            s.avg_views
        );
    }
    out
}
