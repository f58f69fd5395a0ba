use postpulse_core::{is_configured, TenantId, DISCORD_CHANNEL_ID_KEY, DISCORD_TOKEN_KEY};
use sqlx::PgPool;

use crate::error::SyncError;

/// Bot token and channel a tenant has configured for syncing.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelCredentials {
    pub token: String,
    pub channel_id: String,
}

impl std::fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelCredentials")
            .field("token", &"[redacted]")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// Builds credentials from raw setting values.
///
/// # Errors
///
/// Returns [`SyncError::MissingCredentials`] unless both values are configured.
pub fn resolve_credentials(
    token: Option<&str>,
    channel_id: Option<&str>,
) -> Result<ChannelCredentials, SyncError> {
    match (token, channel_id) {
        (Some(token), Some(channel_id))
            if is_configured(Some(token)) && is_configured(Some(channel_id)) =>
        {
            Ok(ChannelCredentials {
                token: token.trim().to_string(),
                channel_id: channel_id.trim().to_string(),
            })
        }
        _ => Err(SyncError::MissingCredentials),
    }
}

/// Reads the tenant's Discord settings.
///
/// # Errors
///
/// Returns [`SyncError::MissingCredentials`] if either setting is absent or
/// unusable, or [`SyncError::Db`] if the settings cannot be read.
pub async fn load_channel_credentials(
    pool: &PgPool,
    tenant: &TenantId,
) -> Result<ChannelCredentials, SyncError> {
    let token = postpulse_db::get_setting(pool, tenant, DISCORD_TOKEN_KEY).await?;
    let channel_id = postpulse_db::get_setting(pool, tenant, DISCORD_CHANNEL_ID_KEY).await?;

    resolve_credentials(
        token.as_ref().map(|row| row.value.as_str()),
        channel_id.as_ref().map(|row| row.value.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_values_present_resolve() {
        let creds = resolve_credentials(Some(" bot-token "), Some("123456")).unwrap();
        assert_eq!(creds.token, "bot-token");
        assert_eq!(creds.channel_id, "123456");
    }

    #[test]
    fn missing_or_placeholder_values_are_rejected() {
        for (token, channel) in [
            (None, Some("123")),
            (Some("tok"), None),
            (Some(""), Some("123")),
            (Some("tok"), Some("   ")),
            (Some("********"), Some("123")),
            (Some("tok"), Some("••••configured••••")),
        ] {
            assert!(
                matches!(
                    resolve_credentials(token, channel),
                    Err(SyncError::MissingCredentials)
                ),
                "token={token:?} channel={channel:?}"
            );
        }
    }

    #[test]
    fn debug_hides_the_token() {
        let creds = resolve_credentials(Some("very-secret"), Some("1")).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
