//! Per-worker schema isolation for parallel database tests.
//!
//! Every test worker gets its own PostgreSQL schema, named after the
//! worker's identity (`test_schema_<id>`). The fixture creates the schema,
//! applies the migration history into it, hands out a handle confined to
//! it, and drops it again when the worker is done.
//!
//! This crate holds the domain types, configuration, port traits and the
//! orchestration. Adapters live elsewhere:
//!
//! - `schemata-db`: PostgreSQL backend and in-process migrations (`sqlx`)
//! - `schemata-runtime`: migrations through an external command
//!
//! ```ignore
//! let fixture = SchemaFixture::new(PgSchemaBackend::default(), runner);
//! let config = FixtureConfig::from_env()?;
//! let mut lease = fixture.acquire(&config).await?;
//! // ... run tests against lease.handle() ...
//! fixture.release(&mut lease).await;
//! ```

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use config::{ConfigError, DEFAULT_DATABASE_URL, FixtureConfig, MissingConfigPolicy};
pub use domain::{SchemaName, SchemaSelector, ScopedTarget, WorkerId};
pub use ports::{
    BackendError, FixtureError, MigrationError, MigrationReport, MigrationRunner, NoopMigrations,
    SchemaBackend,
};
pub use services::{
    SchemaFixture, SchemaLease, SweepOptions, SweepReport, Teardown, WorkerSchema,
    sweep_orphaned_schemas,
};
