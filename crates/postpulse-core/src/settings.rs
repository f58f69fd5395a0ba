use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DISCORD_TOKEN_KEY: &str = "discord_token";
pub const DISCORD_CHANNEL_ID_KEY: &str = "discord_channel_id";

/// Shown in place of any stored secret.
pub const MASKED_VALUE: &str = "••••configured••••";

/// Placeholder older clients saved instead of a real value.
const LEGACY_PLACEHOLDER: &str = "********";

/// A per-tenant key/value configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Copy of this setting safe to return to a client.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: mask_setting_value(&self.value),
            updated_at: self.updated_at,
        }
    }
}

#[must_use]
pub fn mask_setting_value(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        MASKED_VALUE.to_string()
    }
}

/// Returns `true` when `value` holds a usable credential.
#[must_use]
pub fn is_configured(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("" | LEGACY_PLACEHOLDER) => false,
        Some(v) => v != MASKED_VALUE,
    }
}
