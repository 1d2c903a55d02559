//! Worker identity.
//!
//! A worker is one parallel unit of test execution. The surrounding test
//! runner hands each worker a token (process slot, thread index, ...) that
//! stays stable for the worker's lifetime and is never shared by two live
//! workers at once. Isolation depends on that uniqueness; it is assumed,
//! not verified.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::schema::{MAX_IDENTIFIER_LEN, SCHEMA_PREFIX};
use crate::config::ConfigError;

/// Identity used when the environment does not supply one.
pub const DEFAULT_WORKER_ID: &str = "0";

/// Longest worker token that still yields a legal schema name.
pub const MAX_WORKER_ID_LEN: usize = MAX_IDENTIFIER_LEN - SCHEMA_PREFIX.len();

/// Validated worker identity.
///
/// Tokens are lowercase so that the derived schema name is a plain
/// PostgreSQL identifier. Uppercase input is rejected rather than folded:
/// `"A"` and `"a"` are different workers and must not share a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerId(String);

impl WorkerId {
    /// Validate and wrap a worker token.
    ///
    /// Accepts lowercase ASCII letters, digits and `_`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
        let raw = raw.as_ref().trim();

        if raw.is_empty() {
            return Err(ConfigError::InvalidWorkerId {
                value: raw.to_string(),
                reason: "worker id cannot be empty".to_string(),
            });
        }

        if raw.len() > MAX_WORKER_ID_LEN {
            return Err(ConfigError::InvalidWorkerId {
                value: raw.to_string(),
                reason: format!("worker id longer than {MAX_WORKER_ID_LEN} bytes"),
            });
        }

        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
        {
            return Err(ConfigError::InvalidWorkerId {
                value: raw.to_string(),
                reason: format!("unsupported character {bad:?}"),
            });
        }

        Ok(Self(raw.to_string()))
    }

    /// The fallback identity `"0"`.
    pub fn default_worker() -> Self {
        Self(DEFAULT_WORKER_ID.to_string())
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::default_worker()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for WorkerId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for WorkerId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkerId> for String {
    fn from(value: WorkerId) -> Self {
        value.0
    }
}

impl From<u32> for WorkerId {
    fn from(slot: u32) -> Self {
        Self(slot.to_string())
    }
}
