//! Cleanup of worker schemas left behind by killed test runs.
//!
//! A hard kill skips teardown, so its schema survives. The next run's
//! idempotent create copes with that for the same worker id; this sweep
//! removes the rest.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{SchemaSelector, ScopedTarget, WorkerId};
use crate::ports::{BackendError, SchemaBackend};

/// What to sweep.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Server to sweep.
    pub base_url: Url,
    /// Workers that are still live; their schemas are kept.
    pub keep: BTreeSet<WorkerId>,
    /// Report what would be dropped without dropping anything.
    pub dry_run: bool,
}

impl SweepOptions {
    /// Sweep everything on `base_url`.
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            keep: BTreeSet::new(),
            dry_run: false,
        }
    }

    /// Keep the schema of `worker`.
    #[must_use]
    pub fn keep(mut self, worker: WorkerId) -> Self {
        self.keep.insert(worker);
        self
    }

    /// Only report.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// A schema the sweep could not drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub schema: String,
    pub reason: String,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Dropped schemas (or, for a dry run, the ones that would be).
    pub dropped: Vec<String>,
    /// Schemas belonging to live workers.
    pub kept: Vec<String>,
    /// Schemas whose drop failed.
    pub failed: Vec<SweepFailure>,
    pub dry_run: bool,
}

/// Drop every worker schema not owned by a worker in `options.keep`.
///
/// Only listing failures are returned as errors; individual drop failures
/// are recorded in the report and the sweep carries on.
pub async fn sweep_orphaned_schemas<B>(
    backend: &B,
    options: &SweepOptions,
) -> Result<SweepReport, BackendError>
where
    B: SchemaBackend + ?Sized,
{
    let schemas = backend.list_worker_schemas(&options.base_url).await?;
    let mut report = SweepReport {
        dry_run: options.dry_run,
        ..SweepReport::default()
    };

    if schemas.is_empty() {
        debug!("No worker schemas found");
        return Ok(report);
    }

    info!("Found {} worker schemas, checking for orphans", schemas.len());

    for schema in schemas {
        let name = schema.to_string();

        if options.keep.contains(&schema.worker_id()) {
            debug!(%name, "Keeping schema of live worker");
            report.kept.push(name);
            continue;
        }

        if options.dry_run {
            report.dropped.push(name);
            continue;
        }

        let target = ScopedTarget::new(options.base_url.clone(), schema, SchemaSelector::default());
        match backend.drop_schema(&target).await {
            Ok(()) => {
                debug!(%name, "Dropped orphaned schema");
                report.dropped.push(name);
            }
            Err(e) => {
                warn!(%name, "Failed to drop orphaned schema: {}", e);
                report.failed.push(SweepFailure {
                    schema: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Sweep complete: {} dropped, {} kept, {} failed",
        report.dropped.len(),
        report.kept.len(),
        report.failed.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeBackend;

    fn base() -> Url {
        Url::parse("postgres://localhost/yourdb_test").unwrap()
    }

    #[tokio::test]
    async fn test_sweep_drops_orphans_and_keeps_live_workers() {
        let backend = FakeBackend::default();
        for name in ["test_schema_0", "test_schema_1", "test_schema_2", "public"] {
            backend.seed(name);
        }

        let options = SweepOptions::new(base()).keep(WorkerId::from(1));
        let report = sweep_orphaned_schemas(&backend, &options).await.unwrap();

        assert_eq!(report.dropped, vec!["test_schema_0", "test_schema_2"]);
        assert_eq!(report.kept, vec!["test_schema_1"]);
        assert!(report.failed.is_empty());
        assert!(backend.exists("test_schema_1"));
        assert!(backend.exists("public"));
        assert!(!backend.exists("test_schema_0"));
    }

    #[tokio::test]
    async fn test_dry_run_drops_nothing() {
        let backend = FakeBackend::default();
        backend.seed("test_schema_4");

        let options = SweepOptions::new(base()).dry_run(true);
        let report = sweep_orphaned_schemas(&backend, &options).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.dropped, vec!["test_schema_4"]);
        assert!(backend.exists("test_schema_4"));
        assert_eq!(backend.drops(), 0);
    }

    #[tokio::test]
    async fn test_drop_failures_are_collected() {
        let backend = FakeBackend::default();
        backend.seed("test_schema_5");
        backend.fail_drop(true);

        let report = sweep_orphaned_schemas(&backend, &SweepOptions::new(base()))
            .await
            .unwrap();

        assert!(report.dropped.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].schema, "test_schema_5");
    }

    #[tokio::test]
    async fn test_empty_server() {
        let backend = FakeBackend::default();
        let report = sweep_orphaned_schemas(&backend, &SweepOptions::new(base()))
            .await
            .unwrap();
        assert_eq!(report, SweepReport::default());
    }
}
