//! `schemata`: maintenance commands for per-worker test schemas.
//!
//! - `schemata target` prints the scoped URL a worker would connect with
//! - `schemata list` shows the worker schemas present on the server
//! - `schemata sweep` drops schemas left behind by killed test runs

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use anyhow as _;
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliContext, ConfigOverrides, bootstrap, resolve_fixture_config};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
