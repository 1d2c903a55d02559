//! CLI bootstrap: resolves configuration and wires the PostgreSQL backend.
//!
//! Command-line flags take precedence over the environment. Whatever is
//! still missing falls back to the documented defaults with a warning.

use schemata_core::config::{DATABASE_URL_ENV, SELECTOR_ENV, WORKER_ID_ENV};
use schemata_core::domain::{parse_base_url, redact};
use schemata_core::{ConfigError, DEFAULT_DATABASE_URL, FixtureConfig};
use schemata_db::PgSchemaBackend;
use tracing::warn;
use url::Url;

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub worker: Option<String>,
    pub selector: Option<String>,
}

impl ConfigOverrides {
    fn get(&self, key: &str) -> Option<&str> {
        match key {
            DATABASE_URL_ENV => self.database_url.as_deref(),
            WORKER_ID_ENV => self.worker.as_deref(),
            SELECTOR_ENV => self.selector.as_deref(),
            _ => None,
        }
    }
}

/// Shared state handed to command handlers.
#[derive(Debug)]
pub struct CliContext {
    pub base_url: Url,
    pub backend: PgSchemaBackend,
}

/// Build the context for commands that only need the server.
pub fn bootstrap(database_url: Option<&str>) -> Result<CliContext, ConfigError> {
    Ok(CliContext {
        base_url: resolve_base_url(database_url)?,
        backend: PgSchemaBackend::default(),
    })
}

/// The server URL from the flag (or `DATABASE_URL`), else the default.
pub fn resolve_base_url(database_url: Option<&str>) -> Result<Url, ConfigError> {
    match database_url.filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_base_url(raw),
        None => {
            warn!(
                "{} not set, using default {}",
                DATABASE_URL_ENV,
                redact(DEFAULT_DATABASE_URL)
            );
            parse_base_url(DEFAULT_DATABASE_URL)
        }
    }
}

/// Resolve a full fixture configuration, overrides first.
pub fn resolve_fixture_config<F>(
    overrides: &ConfigOverrides,
    env: F,
) -> Result<FixtureConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    FixtureConfig::from_lookup(|key| {
        overrides
            .get(key)
            .map(str::to_string)
            .or_else(|| env(key))
    })
}
