use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("POSTPULSE_ENV", "development"));
    let bind_addr = parse_addr("POSTPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("POSTPULSE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("POSTPULSE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("POSTPULSE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("POSTPULSE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let discord_api_base = or_default("POSTPULSE_DISCORD_API_BASE", "https://discord.com/api/v10");
    let discord_timeout_secs = parse_u64("POSTPULSE_DISCORD_TIMEOUT_SECS", "20")?;

    let fxtwitter_api_base =
        or_default("POSTPULSE_FXTWITTER_API_BASE", "https://api.fxtwitter.com");
    let lookup_timeout_secs = parse_u64("POSTPULSE_LOOKUP_TIMEOUT_SECS", "10")?;
    let lookup_max_retries = parse_u32("POSTPULSE_LOOKUP_MAX_RETRIES", "1")?;
    let lookup_backoff_ms = parse_u64("POSTPULSE_LOOKUP_BACKOFF_MS", "500")?;

    let sync_max_concurrent_lookups = parse_concurrency(&or_default(
        "POSTPULSE_SYNC_MAX_CONCURRENT_LOOKUPS",
        "4",
    ))?;

    let user_agent = or_default(
        "POSTPULSE_USER_AGENT",
        "postpulse/0.1 (engagement-tracking)",
    );
    let api_keys = parse_api_keys(&or_default("POSTPULSE_API_KEYS", ""));

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        discord_api_base,
        discord_timeout_secs,
        fxtwitter_api_base,
        lookup_timeout_secs,
        lookup_max_retries,
        lookup_backoff_ms,
        sync_max_concurrent_lookups,
        user_agent,
        api_keys,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, ConfigError> {
    const VAR: &str = "POSTPULSE_SYNC_MAX_CONCURRENT_LOOKUPS";
    let value = raw.parse::<usize>().map_err(|e| ConfigError::InvalidEnvVar {
        var: VAR.to_string(),
        reason: e.to_string(),
    })?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: VAR.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}
