//! Chat-history provider client for Discord's REST API.
//!
//! [`DiscordClient::connect`] validates the bot token and yields a
//! [`DiscordSession`]; message pages are fetched through the session, newest
//! first, with an optional `before` cursor.

mod client;
mod error;
mod types;

pub use client::{DiscordClient, DiscordSession, MAX_PAGE_SIZE};
pub use error::DiscordError;
pub use types::{BotUser, Message, MessageAuthor};
