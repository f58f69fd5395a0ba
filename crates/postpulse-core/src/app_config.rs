use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub discord_api_base: String,
    pub discord_timeout_secs: u64,
    pub fxtwitter_api_base: String,
    pub lookup_timeout_secs: u64,
    pub lookup_max_retries: u32,
    pub lookup_backoff_ms: u64,
    pub sync_max_concurrent_lookups: usize,
    pub user_agent: String,
    /// Bearer tokens accepted by the HTTP API. Empty disables auth in development.
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("discord_api_base", &self.discord_api_base)
            .field("discord_timeout_secs", &self.discord_timeout_secs)
            .field("fxtwitter_api_base", &self.fxtwitter_api_base)
            .field("lookup_timeout_secs", &self.lookup_timeout_secs)
            .field("lookup_max_retries", &self.lookup_max_retries)
            .field("lookup_backoff_ms", &self.lookup_backoff_ms)
            .field(
                "sync_max_concurrent_lookups",
                &self.sync_max_concurrent_lookups,
            )
            .field("user_agent", &self.user_agent)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
