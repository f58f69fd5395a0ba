use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::CoreError;

const MIN_LEN: usize = 9;
const MAX_LEN: usize = 128;

/// Caller identity that scopes every stored post, setting and sync run.
///
/// Always supplied by the caller; never generated on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Validates and wraps a raw tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTenant`] when the trimmed value is shorter
    /// than 9 or longer than 128 characters, or contains characters other than
    /// ASCII alphanumerics, `-`, `_` and `.`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.len() < MIN_LEN || trimmed.len() > MAX_LEN {
            return Err(CoreError::InvalidTenant(format!(
                "length must be between {MIN_LEN} and {MAX_LEN}"
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(CoreError::InvalidTenant(
                "only ASCII letters, digits, '-', '_' and '.' are allowed".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TenantId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
