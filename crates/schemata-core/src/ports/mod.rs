//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the fixture expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - No process implementation details
//! - Intent-based methods ("create the schema"), not statement-level ones

pub mod migration_runner;
pub mod schema_backend;

use thiserror::Error;

use crate::config::ConfigError;

pub use migration_runner::{MigrationReport, MigrationRunner, NoopMigrations};
pub use schema_backend::SchemaBackend;

#[cfg(test)]
pub use migration_runner::MockMigrationRunner;

/// Errors reported by a [`SchemaBackend`].
///
/// Abstracts away driver errors so the fixture never sees `sqlx` types.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Could not open a connection to the server.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A statement was rejected by the server.
    #[error("Statement failed: {0}")]
    Statement(String),
}

/// Errors reported by a [`MigrationRunner`].
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migration command could not be started.
    #[error("Failed to start migration command '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// The migration command ran and exited unsuccessfully.
    #[error("Migration command '{program}' exited with {}: {stderr}", describe_exit(.code))]
    Failed {
        program: String,
        /// Exit code, `None` if terminated by a signal.
        code: Option<i32>,
        /// Tail of the command's stderr.
        stderr: String,
    },

    /// The migration source (directory, embedded set) could not be loaded.
    #[error("Failed to load migrations: {0}")]
    Source(String),

    /// An in-process migration failed while applying.
    #[error("Failed to apply migrations: {0}")]
    Apply(String),
}

#[allow(clippy::ref_option)]
fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

/// Setup failures: no handle exists when one of these is returned.
///
/// Teardown failures are reported through [`crate::services::Teardown`].
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `CREATE SCHEMA IF NOT EXISTS` failed.
    #[error("Failed to create schema {schema}: {source}")]
    CreateSchema {
        schema: String,
        #[source]
        source: BackendError,
    },

    /// The migration step failed.
    #[error("Failed to migrate schema {schema}: {source}")]
    Migration {
        schema: String,
        #[source]
        source: MigrationError,
    },

    /// The long-lived handle could not be opened.
    #[error("Failed to connect to schema {schema}: {source}")]
    Connect {
        schema: String,
        #[source]
        source: BackendError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_failure_message_includes_exit_status() {
        let err = MigrationError::Failed {
            program: "sqlx".to_string(),
            code: Some(3),
            stderr: "relation already exists".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("status 3"));
        assert!(msg.contains("relation already exists"));

        let killed = MigrationError::Failed {
            program: "sqlx".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("a signal"));
    }

    #[test]
    fn test_fixture_error_names_schema() {
        let err = FixtureError::CreateSchema {
            schema: "test_schema_1".to_string(),
            source: BackendError::Statement("permission denied".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create schema test_schema_1: Statement failed: permission denied"
        );
    }
}
