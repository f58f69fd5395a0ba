use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid media type: {0}")]
    InvalidMediaType(String),

    #[error("invalid sort field: {0}")]
    InvalidSort(String),

    #[error("invalid sort order: {0}")]
    InvalidOrder(String),

    #[error("invalid tenant id: {0}")]
    InvalidTenant(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
