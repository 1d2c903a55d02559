//! Failures surfaced by `schemata` and the status each exits with.

use schemata_core::{BackendError, ConfigError};
use thiserror::Error;

/// Why a `schemata` command failed.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failure that fits none of the categories below.
    #[error("{0}")]
    Core(String),

    /// Flag combination the command cannot act on.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The report could not be written to the terminal or pipe.
    #[error("IO error: {0}")]
    Io(String),

    /// Worker id, selector or database URL did not resolve.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server refused a connection or a schema statement.
    #[error("Database error: {0}")]
    Database(String),
}

impl CliError {
    /// Process status for this failure.
    ///
    /// CI scripts branch on these, so each category keeps its own
    /// `sysexits.h` value: usage 2, unreachable server 69, output 74,
    /// configuration 78. Everything else is 1.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,
            Self::Database(_) => 69,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
            Self::Core(_) => 1,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<BackendError> for CliError {
    fn from(err: BackendError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(format!("Failed to render JSON: {err}"))
    }
}
