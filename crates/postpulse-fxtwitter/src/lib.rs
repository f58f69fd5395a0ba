//! Engagement provider client for the fxtwitter status API.
//!
//! [`FxTwitterClient::lookup`] never fails: any provider problem is logged
//! and reported as `None` so a sync can fall back to chat-supplied data.

mod client;
mod error;
mod retry;
mod types;

pub use client::{FxTwitterClient, RetryPolicy};
pub use error::FxTwitterError;
