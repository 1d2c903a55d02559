//! Sweep command handler.

use std::io::Write;

use schemata_core::{SchemaBackend, SweepOptions, SweepReport, WorkerId, sweep_orphaned_schemas};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Drop orphaned worker schemas and print the report.
pub async fn execute<B>(
    backend: &B,
    ctx: &CliContext,
    keep: &[String],
    dry_run: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<SweepReport, CliError>
where
    B: SchemaBackend + ?Sized,
{
    let mut options = SweepOptions::new(ctx.base_url.clone()).dry_run(dry_run);
    for raw in keep {
        let worker = WorkerId::new(raw).map_err(|e| CliError::Arguments(e.to_string()))?;
        options = options.keep(worker);
    }

    let report = sweep_orphaned_schemas(backend, &options).await?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        print_report(&report, out)?;
    }

    Ok(report)
}

fn print_report(report: &SweepReport, out: &mut impl Write) -> Result<(), CliError> {
    let verb = if report.dry_run { "Would drop" } else { "Dropped" };
    for name in &report.dropped {
        writeln!(out, "{verb} {name}")?;
    }
    for name in &report.kept {
        writeln!(out, "Kept {name}")?;
    }
    for failure in &report.failed {
        writeln!(out, "Failed {}: {}", failure.schema, failure.reason)?;
    }
    writeln!(
        out,
        "{} dropped, {} kept, {} failed",
        report.dropped.len(),
        report.kept.len(),
        report.failed.len()
    )?;
    Ok(())
}
