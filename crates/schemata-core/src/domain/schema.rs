//! Schema names derived from worker identities.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::worker::WorkerId;
use crate::config::ConfigError;

/// Prefix shared by every per-worker test schema.
pub const SCHEMA_PREFIX: &str = "test_schema_";

/// PostgreSQL truncates identifiers beyond `NAMEDATALEN - 1` bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Name of a per-worker schema.
///
/// Always matches `[a-z_][a-z0-9_]*` and fits in [`MAX_IDENTIFIER_LEN`]
/// bytes, so it is legal both quoted and unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

impl SchemaName {
    /// Derive the schema owned by `worker`.
    ///
    /// The mapping is injective: distinct workers never share a schema.
    pub fn for_worker(worker: &WorkerId) -> Self {
        Self(format!("{SCHEMA_PREFIX}{}", worker.as_str()))
    }

    /// Parse an existing schema name (e.g. one listed by the server).
    ///
    /// Only names produced by [`SchemaName::for_worker`] are accepted.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let token = raw
            .strip_prefix(SCHEMA_PREFIX)
            .ok_or_else(|| ConfigError::InvalidSchemaName {
                value: raw.to_string(),
                reason: format!("missing '{SCHEMA_PREFIX}' prefix"),
            })?;

        let worker = WorkerId::new(token).map_err(|_| ConfigError::InvalidSchemaName {
            value: raw.to_string(),
            reason: "suffix is not a valid worker id".to_string(),
        })?;

        // Whitespace around the suffix is trimmed by WorkerId; a listed name must not carry any.
        if worker.as_str() != token {
            return Err(ConfigError::InvalidSchemaName {
                value: raw.to_string(),
                reason: "suffix carries surrounding whitespace".to_string(),
            });
        }

        Ok(Self::for_worker(&worker))
    }

    /// The worker this schema belongs to.
    pub fn worker_id(&self) -> WorkerId {
        let token = &self.0[SCHEMA_PREFIX.len()..];
        WorkerId::new(token).unwrap_or_default()
    }

    /// Borrow the bare name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a double-quoted SQL identifier.
    pub fn quoted(&self) -> String {
        // Validation already excludes '"', but keep the escaping rule intact.
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for SchemaName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaName> for String {
    fn from(value: SchemaName) -> Self {
        value.0
    }
}

/// Whether `name` looks like a per-worker schema.
pub fn is_worker_schema(name: &str) -> bool {
    SchemaName::parse(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_for_worker_prefixes_identity() {
        let schema = SchemaName::for_worker(&WorkerId::new("2").unwrap());
        assert_eq!(schema.as_str(), "test_schema_2");
    }

    #[test]
    fn test_distinct_workers_get_distinct_schemas() {
        let names: HashSet<SchemaName> = (0..256u32)
            .map(|slot| SchemaName::for_worker(&WorkerId::from(slot)))
            .collect();
        assert_eq!(names.len(), 256);
    }

    #[test]
    fn test_round_trips_to_worker() {
        let worker = WorkerId::new("ci_shard_3").unwrap();
        let schema = SchemaName::for_worker(&worker);
        assert_eq!(schema.worker_id(), worker);
        assert_eq!(SchemaName::parse(schema.as_str()).unwrap(), schema);
    }

    #[test]
    fn test_longest_worker_fits_identifier_limit() {
        let worker = WorkerId::new("x".repeat(crate::domain::MAX_WORKER_ID_LEN)).unwrap();
        let schema = SchemaName::for_worker(&worker);
        assert_eq!(schema.as_str().len(), MAX_IDENTIFIER_LEN);
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert!(SchemaName::parse("public").is_err());
        assert!(SchemaName::parse("test_schema_").is_err());
        assert!(SchemaName::parse("test_schema_A").is_err());
        assert!(SchemaName::parse("test_schema_1-2").is_err());
        assert!(SchemaName::parse("test_schema_ 1").is_err());
        assert!(!is_worker_schema("pg_catalog"));
        assert!(is_worker_schema("test_schema_11"));
    }

    #[test]
    fn test_quoted() {
        let schema = SchemaName::for_worker(&WorkerId::new("5").unwrap());
        assert_eq!(schema.quoted(), "\"test_schema_5\"");
    }
}
