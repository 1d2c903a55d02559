//! In-process migrations with `sqlx::migrate`.
//!
//! Migrations run on a connection whose `search_path` is the worker schema,
//! so both the migrated objects and the `_sqlx_migrations` bookkeeping table
//! live inside it and disappear with it.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::migrate::{Migrate, Migrator};
use sqlx::{Connection, PgConnection};
use tracing::debug;

use schemata_core::{MigrationError, MigrationReport, MigrationRunner, ScopedTarget};

use crate::backend::scoped_options;

enum Source {
    Directory(PathBuf),
    Loaded(Migrator),
}

/// Applies a `sqlx` migration set inside the worker schema.
pub struct SqlxMigrationRunner {
    source: Source,
}

impl SqlxMigrationRunner {
    /// Load migrations from `dir` on every `apply`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Directory(dir.into()),
        }
    }

    /// Use an already built migrator (e.g. from `sqlx::migrate!()`).
    pub fn from_migrator(mut migrator: Migrator) -> Self {
        // Workers never share a schema, so the database-wide advisory lock
        // would only serialize them.
        migrator.set_locking(false);
        Self {
            source: Source::Loaded(migrator),
        }
    }

    fn describe(&self) -> String {
        match &self.source {
            Source::Directory(dir) => format!("sqlx migrations from {}", dir.display()),
            Source::Loaded(m) => format!("sqlx migrations ({} embedded)", m.iter().count()),
        }
    }

    async fn run(migrator: &Migrator, target: &ScopedTarget) -> Result<usize, MigrationError> {
        let options = scoped_options(target.base(), target.schema())
            .map_err(|e| MigrationError::Apply(e.to_string()))?;
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| MigrationError::Apply(e.to_string()))?;

        let outcome = Self::run_on(migrator, &mut conn).await;

        if let Err(e) = conn.close().await {
            debug!("Ignoring error while closing migration connection: {}", e);
        }
        outcome
    }

    async fn run_on(migrator: &Migrator, conn: &mut PgConnection) -> Result<usize, MigrationError> {
        let apply_err = |e: sqlx::migrate::MigrateError| MigrationError::Apply(e.to_string());

        conn.ensure_migrations_table().await.map_err(apply_err)?;
        let before = conn.list_applied_migrations().await.map_err(apply_err)?.len();

        migrator.run_direct(&mut *conn).await.map_err(apply_err)?;

        let after = conn.list_applied_migrations().await.map_err(apply_err)?.len();
        Ok(after.saturating_sub(before))
    }
}

#[async_trait]
impl MigrationRunner for SqlxMigrationRunner {
    async fn apply(&self, target: &ScopedTarget) -> Result<MigrationReport, MigrationError> {
        let started = Instant::now();

        let applied = match &self.source {
            Source::Directory(dir) => {
                let mut migrator = Migrator::new(dir.as_path())
                    .await
                    .map_err(|e| MigrationError::Source(e.to_string()))?;
                migrator.set_locking(false);
                Self::run(&migrator, target).await?
            }
            Source::Loaded(migrator) => Self::run(migrator, target).await?,
        };

        debug!(schema = %target.schema(), applied, "sqlx migrations finished");
        Ok(MigrationReport::new(
            self.describe(),
            Some(applied),
            started.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_core::{FixtureConfig, WorkerId};

    #[tokio::test]
    async fn test_missing_directory_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SqlxMigrationRunner::from_dir(dir.path().join("does-not-exist"));
        let target = FixtureConfig::new(WorkerId::from(1), "postgres://localhost/yourdb_test")
            .unwrap()
            .target();

        let err = runner.apply(&target).await.unwrap_err();
        assert!(matches!(err, MigrationError::Source(_)));
    }

    #[test]
    fn test_describe_names_directory() {
        let runner = SqlxMigrationRunner::from_dir("migrations");
        assert_eq!(runner.describe(), "sqlx migrations from migrations");
    }
}
