//! Domain model and pure logic for postpulse.
//!
//! Holds the weekly time-window math, post-link extraction, per-author
//! leaderboard aggregation and environment-driven configuration. Nothing in
//! this crate performs I/O beyond reading env vars.

pub mod app_config;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod links;
pub mod posts;
pub mod settings;
pub mod tenant;
pub mod week;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use leaderboard::{build_leaderboard, AuthorStats, LeaderboardOptions, LeaderboardSort};
pub use links::{extract_post_urls, parse_post_id};
pub use posts::{
    source_message_id, CandidateEntry, EngagementUpdate, MediaType, NewPost, PostDetails,
    PostRecord, PostSort, SortOrder,
};
pub use settings::{
    is_configured, mask_setting_value, Setting, DISCORD_CHANNEL_ID_KEY, DISCORD_TOKEN_KEY,
    MASKED_VALUE,
};
pub use tenant::TenantId;
pub use week::{
    available_weeks, week_boundaries, week_boundaries_for_index, week_index, week_start,
    WeekBoundaries,
};
