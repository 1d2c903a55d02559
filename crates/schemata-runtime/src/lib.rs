//! Process-level adapters for schemata.
//!
//! [`CommandMigrationRunner`] applies migrations by running the project's
//! own migration tool (by default `sqlx migrate run`) with the worker's
//! scoped connection string in its environment.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use url as _;

mod command;

pub use command::{CommandMigrationRunner, DEFAULT_MIGRATE_CMD, MIGRATE_CMD_ENV};
