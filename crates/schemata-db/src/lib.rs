//! PostgreSQL adapters for schemata.
//!
//! - [`PgSchemaBackend`] creates, scopes and drops worker schemas
//! - [`SqlxMigrationRunner`] applies a `sqlx` migration set inside one
//!
//! ```ignore
//! use schemata_core::{FixtureConfig, SchemaFixture};
//! use schemata_db::{PgSchemaBackend, SqlxMigrationRunner};
//!
//! let fixture = SchemaFixture::new(
//!     PgSchemaBackend::default(),
//!     SqlxMigrationRunner::from_dir("migrations"),
//! );
//! let mut lease = fixture.acquire(&FixtureConfig::from_env()?).await?;
//! sqlx::query("SELECT 1").execute(lease.handle().pool()).await?;
//! fixture.release(&mut lease).await;
//! ```

#![deny(unused_crate_dependencies)]

mod backend;
mod migrate;

pub use backend::{PgSchemaBackend, PoolSettings, ScopedPool, admin_options, scoped_options};
pub use migrate::SqlxMigrationRunner;

use schemata_core::SchemaFixture;

/// Fixture wired to PostgreSQL.
pub type PgFixture<M> = SchemaFixture<PgSchemaBackend, M>;

/// Fixture that applies the migrations under `dir` with `sqlx`.
pub fn pg_fixture(dir: impl Into<std::path::PathBuf>) -> PgFixture<SqlxMigrationRunner> {
    SchemaFixture::new(PgSchemaBackend::default(), SqlxMigrationRunner::from_dir(dir))
}
