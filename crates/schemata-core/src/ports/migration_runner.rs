//! Migration runner trait definition.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::MigrationError;
use crate::domain::ScopedTarget;

/// Outcome of a successful migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Human-readable runner description (command line, source directory).
    pub runner: String,
    /// Number of migrations applied, when the runner can tell.
    pub applied: Option<usize>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl MigrationReport {
    /// Create a report.
    pub fn new(runner: impl Into<String>, applied: Option<usize>, elapsed: Duration) -> Self {
        Self {
            runner: runner.into(),
            applied,
            elapsed,
        }
    }
}

/// Applies the full migration history to a schema-scoped target.
///
/// Implementations run to completion: no timeout, no retry. Any failure
/// is fatal to the acquiring worker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    /// Apply every pending migration inside `target`'s schema.
    async fn apply(&self, target: &ScopedTarget) -> Result<MigrationReport, MigrationError>;
}

/// Runner that applies nothing.
///
/// For suites that create their own tables after acquiring the handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMigrations;

#[async_trait]
impl MigrationRunner for NoopMigrations {
    async fn apply(&self, _target: &ScopedTarget) -> Result<MigrationReport, MigrationError> {
        Ok(MigrationReport::new("noop", Some(0), Duration::ZERO))
    }
}

#[async_trait]
impl<T: MigrationRunner + ?Sized> MigrationRunner for std::sync::Arc<T> {
    async fn apply(&self, target: &ScopedTarget) -> Result<MigrationReport, MigrationError> {
        (**self).apply(target).await
    }
}
