//! Lazily acquired, worker-wide schema.
//!
//! Test binaries typically keep one [`WorkerSchema`] in a static (or a
//! suite-level fixture). The first test to call [`WorkerSchema::get`]
//! acquires the schema; every later call reuses the same handle. The
//! harness calls [`WorkerSchema::shutdown`] once when the worker finishes.
//!
//! Acquisition runs at most once. A failure is remembered and handed to
//! every caller for the rest of the worker's life.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::fixture::{SchemaFixture, SchemaLease, Teardown};
use crate::config::FixtureConfig;
use crate::ports::{FixtureError, MigrationRunner, SchemaBackend};

/// A worker's schema, created on first use.
pub struct WorkerSchema<B: SchemaBackend, M> {
    fixture: SchemaFixture<B, M>,
    config: FixtureConfig,
    lease: OnceCell<Result<SchemaLease<B::Handle>, Arc<FixtureError>>>,
}

impl<B, M> WorkerSchema<B, M>
where
    B: SchemaBackend,
    M: MigrationRunner,
{
    /// Wrap a fixture; nothing is acquired yet.
    pub fn new(fixture: SchemaFixture<B, M>, config: FixtureConfig) -> Self {
        Self {
            fixture,
            config,
            lease: OnceCell::new(),
        }
    }

    /// The handle, acquiring the schema on first call.
    ///
    /// Concurrent first callers wait for a single acquisition. If it fails,
    /// every caller, current and later, gets the same error and nothing is
    /// retried.
    pub async fn get(&self) -> Result<&B::Handle, Arc<FixtureError>> {
        let outcome = self
            .lease
            .get_or_init(|| async {
                self.fixture
                    .acquire(&self.config)
                    .await
                    .map_err(Arc::new)
            })
            .await;
        match outcome {
            Ok(lease) => Ok(lease.handle()),
            Err(e) => Err(Arc::clone(e)),
        }
    }

    /// Whether the schema has been acquired successfully.
    pub fn is_acquired(&self) -> bool {
        matches!(self.lease.get(), Some(Ok(_)))
    }

    /// The configuration this worker resolves its schema from.
    pub const fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Release the schema if it was ever acquired.
    ///
    /// Returns `None` when nothing was acquired, including when acquisition
    /// failed (the fixture already dropped the schema in that case).
    pub async fn shutdown(mut self) -> Option<Teardown> {
        match self.lease.take()? {
            Ok(mut lease) => Some(self.fixture.release(&mut lease).await),
            Err(_) => None,
        }
    }
}
