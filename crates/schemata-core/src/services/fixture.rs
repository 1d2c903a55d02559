//! Per-worker schema fixture.
//!
//! Orchestrates the acquire / release lifecycle over a [`SchemaBackend`] and
//! a [`MigrationRunner`]:
//!
//! 1. derive the schema and scoped target from the configuration
//! 2. create the schema (idempotent, transient connection)
//! 3. apply the migration history (fatal on failure)
//! 4. open the long-lived handle
//! 5. on release, drop the schema (cascade) and close the handle
//!
//! Setup failures are returned as [`FixtureError`]. Teardown failures are
//! reported as [`Teardown::Failed`] and logged, never returned as errors, so
//! they cannot mask the outcome of the tests that ran in the schema.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::config::FixtureConfig;
use crate::domain::{SchemaName, ScopedTarget, WorkerId};
use crate::ports::{FixtureError, MigrationReport, MigrationRunner, SchemaBackend};

/// Result of releasing a lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// The schema was dropped and the handle closed.
    Dropped,
    /// The lease had already been released; nothing was issued.
    AlreadyReleased,
    /// The drop failed. The handle was still closed.
    Failed(String),
}

impl Teardown {
    /// Whether nothing went wrong.
    pub const fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// A worker's schema and the handle bound to it.
///
/// Produced by [`SchemaFixture::acquire`]. Pass it back to
/// [`SchemaFixture::release`] when the worker's session ends; dropping it
/// unreleased leaks the schema until the next run or an orphan sweep.
#[derive(Debug)]
pub struct SchemaLease<H> {
    handle: Option<H>,
    target: ScopedTarget,
    worker_id: WorkerId,
    migrations: MigrationReport,
}

impl<H> SchemaLease<H> {
    /// The schema-scoped handle.
    ///
    /// # Panics
    ///
    /// Panics if the lease has already been released.
    pub fn handle(&self) -> &H {
        self.handle
            .as_ref()
            .expect("schema lease used after release")
    }

    /// The handle, or `None` after release.
    pub const fn try_handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// The worker's schema name.
    pub const fn schema(&self) -> &SchemaName {
        self.target.schema()
    }

    /// The scoped target the lease was built from.
    pub const fn target(&self) -> &ScopedTarget {
        &self.target
    }

    /// The owning worker.
    pub const fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    /// What the migration step reported.
    pub const fn migrations(&self) -> &MigrationReport {
        &self.migrations
    }

    /// Whether [`SchemaFixture::release`] has run for this lease.
    pub const fn is_released(&self) -> bool {
        self.handle.is_none()
    }
}

impl<H> Drop for SchemaLease<H> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!(
                schema = %self.target.schema(),
                "Schema lease dropped without release; schema left behind until the next sweep"
            );
        }
    }
}

/// Fixture wiring a backend and a migration runner together.
pub struct SchemaFixture<B, M> {
    backend: B,
    migrations: M,
}

impl<B, M> SchemaFixture<B, M>
where
    B: SchemaBackend,
    M: MigrationRunner,
{
    /// Create a fixture.
    pub const fn new(backend: B, migrations: M) -> Self {
        Self {
            backend,
            migrations,
        }
    }

    /// The backend, for administrative queries.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Create, migrate and connect the worker's schema.
    ///
    /// Call at most once per worker per session. On error no handle exists;
    /// a schema created before a migration or connect failure is dropped on a
    /// best-effort basis so the next run starts from an empty schema.
    pub async fn acquire(
        &self,
        config: &FixtureConfig,
    ) -> Result<SchemaLease<B::Handle>, FixtureError> {
        let target = config.target();
        let schema = target.schema().to_string();

        info!(worker = %config.worker_id, %schema, "Acquiring worker schema");

        self.backend
            .create_schema(&target)
            .await
            .map_err(|source| FixtureError::CreateSchema {
                schema: schema.clone(),
                source,
            })?;
        debug!(%schema, "Schema ensured");

        let migrations = match self.migrations.apply(&target).await {
            Ok(report) => report,
            Err(source) => {
                self.discard(&target).await;
                return Err(FixtureError::Migration { schema, source });
            }
        };
        info!(
            %schema,
            runner = %migrations.runner,
            applied = ?migrations.applied,
            elapsed_ms = migrations.elapsed.as_millis(),
            "Migrations applied"
        );

        let handle = match self.backend.connect(&target).await {
            Ok(handle) => handle,
            Err(source) => {
                self.discard(&target).await;
                return Err(FixtureError::Connect { schema, source });
            }
        };

        Ok(SchemaLease {
            handle: Some(handle),
            target,
            worker_id: config.worker_id.clone(),
            migrations,
        })
    }

    /// Drop the lease's schema and close its handle.
    ///
    /// Safe to call more than once: later calls issue nothing and report
    /// [`Teardown::AlreadyReleased`].
    pub async fn release(&self, lease: &mut SchemaLease<B::Handle>) -> Teardown {
        let Some(handle) = lease.handle.take() else {
            debug!(schema = %lease.schema(), "Lease already released");
            return Teardown::AlreadyReleased;
        };

        match self.backend.release(handle, &lease.target).await {
            Ok(()) => {
                info!(schema = %lease.schema(), "Worker schema dropped");
                Teardown::Dropped
            }
            Err(e) => {
                warn!(schema = %lease.schema(), "Failed to drop worker schema: {}", e);
                Teardown::Failed(e.to_string())
            }
        }
    }

    /// Acquire, run `body` with the handle, and release on every exit path.
    ///
    /// The body's value is returned unchanged. If the body panics the schema
    /// is released first and the panic then resumes. Teardown problems are
    /// logged only.
    pub async fn scoped<F, Fut, T>(&self, config: &FixtureConfig, body: F) -> Result<T, FixtureError>
    where
        B::Handle: Clone,
        F: FnOnce(B::Handle) -> Fut,
        Fut: Future<Output = T>,
    {
        let mut lease = self.acquire(config).await?;
        let outcome = AssertUnwindSafe(body(lease.handle().clone()))
            .catch_unwind()
            .await;

        self.release(&mut lease).await;

        match outcome {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn discard(&self, target: &ScopedTarget) {
        if let Err(e) = self.backend.drop_schema(target).await {
            warn!(
                schema = %target.schema(),
                "Failed to drop schema after setup failure: {}", e
            );
        }
    }
}
