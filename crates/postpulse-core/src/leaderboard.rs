//! Per-author engagement aggregation for a single week.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use crate::{CoreError, MediaType, PostRecord};

const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    TotalViews,
    AvgViews,
    TotalPosts,
    TotalLikes,
    Username,
}

impl FromStr for LeaderboardSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_views" | "totalViews" => Ok(Self::TotalViews),
            "avg_views" | "avgViews" => Ok(Self::AvgViews),
            "total_posts" | "totalPosts" => Ok(Self::TotalPosts),
            "total_likes" | "totalLikes" => Ok(Self::TotalLikes),
            "username" => Ok(Self::Username),
            other => Err(CoreError::InvalidSort(other.to_string())),
        }
    }
}

/// Filters applied when building a leaderboard. Zero thresholds are ignored.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardOptions {
    pub sort: LeaderboardSort,
    pub media_type: Option<MediaType>,
    pub min_views: u64,
    pub min_avg_views: u64,
    pub top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    pub rank: usize,
    pub username: String,
    pub post_count: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub avg_views: u64,
}

/// Aggregates `posts` per author and ranks them.
///
/// Callers pass the posts of one week. Authors keep first-appearance order
/// when the sort key ties.
#[must_use]
pub fn build_leaderboard(posts: &[PostRecord], options: &LeaderboardOptions) -> Vec<AuthorStats> {
    let mut order: Vec<AuthorStats> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for post in posts {
        if options.media_type.is_some_and(|t| t != post.media_type) {
            continue;
        }
        let username = if post.author.trim().is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            post.author.clone()
        };
        let slot = *slots.entry(username.clone()).or_insert_with(|| {
            order.push(AuthorStats {
                rank: 0,
                username,
                post_count: 0,
                total_views: 0,
                total_likes: 0,
                avg_views: 0,
            });
            order.len() - 1
        });
        let stats = &mut order[slot];
        stats.post_count += 1;
        stats.total_views = stats.total_views.saturating_add(post.view_count);
        stats.total_likes = stats.total_likes.saturating_add(post.like_count);
    }

    for stats in &mut order {
        stats.avg_views = rounded_average(stats.total_views, stats.post_count);
    }

    match options.sort {
        LeaderboardSort::TotalViews => order.sort_by(|a, b| b.total_views.cmp(&a.total_views)),
        LeaderboardSort::AvgViews => order.sort_by(|a, b| b.avg_views.cmp(&a.avg_views)),
        LeaderboardSort::TotalPosts => order.sort_by(|a, b| b.post_count.cmp(&a.post_count)),
        LeaderboardSort::TotalLikes => order.sort_by(|a, b| b.total_likes.cmp(&a.total_likes)),
        LeaderboardSort::Username => order.sort_by(|a, b| a.username.cmp(&b.username)),
    }

    if options.min_views > 0 {
        order.retain(|s| s.total_views >= options.min_views);
    }
    if options.min_avg_views > 0 {
        order.retain(|s| s.avg_views >= options.min_avg_views);
    }
    if options.top_n > 0 {
        order.truncate(options.top_n);
    }

    for (i, stats) in order.iter_mut().enumerate() {
        stats.rank = i + 1;
    }
    order
}

/// Integer average rounded half up.
fn rounded_average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let total = u128::from(total);
    let count = u128::from(count);
    u64::try_from((2 * total + count) / (2 * count)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn post(author: &str, media_type: MediaType, views: u64, likes: u64) -> PostRecord {
        PostRecord {
            id: 0,
            source_message_id: String::new(),
            url: String::new(),
            post_id: String::new(),
            author: author.to_string(),
            content: String::new(),
            media_type,
            view_count: views,
            like_count: likes,
            posted_at: Utc::now(),
            collected_at: Utc::now(),
            week_index: 0,
        }
    }

    fn sample() -> Vec<PostRecord> {
        vec![
            post("alice", MediaType::Video, 100, 10),
            post("bob", MediaType::Photo, 500, 1),
            post("alice", MediaType::Text, 51, 5),
            post("carol", MediaType::Video, 20, 40),
            post("", MediaType::Text, 7, 0),
        ]
    }

    #[test]
    fn default_sort_is_total_views_descending() {
        let board = build_leaderboard(&sample(), &LeaderboardOptions::default());
        let names: Vec<&str> = board.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice", "carol", "Unknown"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[3].rank, 4);
    }

    #[test]
    fn totals_and_rounded_average() {
        let board = build_leaderboard(&sample(), &LeaderboardOptions::default());
        let alice = board.iter().find(|s| s.username == "alice").unwrap();
        assert_eq!(alice.post_count, 2);
        assert_eq!(alice.total_views, 151);
        assert_eq!(alice.total_likes, 15);
        // 75.5 rounds up
        assert_eq!(alice.avg_views, 76);
    }

    #[test]
    fn media_type_filter_applies_before_grouping() {
        let options = LeaderboardOptions {
            media_type: Some(MediaType::Video),
            ..LeaderboardOptions::default()
        };
        let board = build_leaderboard(&sample(), &options);
        let names: Vec<&str> = board.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "carol"]);
        assert_eq!(board[0].total_views, 100);
    }

    #[test]
    fn username_sort_is_ascending() {
        let options = LeaderboardOptions {
            sort: LeaderboardSort::Username,
            ..LeaderboardOptions::default()
        };
        let board = build_leaderboard(&sample(), &options);
        let names: Vec<&str> = board.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["Unknown", "alice", "bob", "carol"]);
    }

    #[test]
    fn thresholds_then_top_n() {
        let options = LeaderboardOptions {
            sort: LeaderboardSort::TotalLikes,
            min_views: 20,
            top_n: 2,
            ..LeaderboardOptions::default()
        };
        let board = build_leaderboard(&sample(), &options);
        let names: Vec<&str> = board.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["carol", "alice"]);
        assert_eq!(board[1].rank, 2);

        let options = LeaderboardOptions {
            min_avg_views: 100,
            ..LeaderboardOptions::default()
        };
        let board = build_leaderboard(&sample(), &options);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].username, "bob");
    }

    #[test]
    fn empty_input_gives_empty_board() {
        assert!(build_leaderboard(&[], &LeaderboardOptions::default()).is_empty());
    }

    #[test]
    fn sort_names_parse_in_both_spellings() {
        assert_eq!("avgViews".parse::<LeaderboardSort>().unwrap(), LeaderboardSort::AvgViews);
        assert_eq!("total_posts".parse::<LeaderboardSort>().unwrap(), LeaderboardSort::TotalPosts);
        assert!("rank".parse::<LeaderboardSort>().is_err());
    }
}
