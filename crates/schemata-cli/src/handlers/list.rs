//! List command handler.

use std::io::Write;

use schemata_core::SchemaBackend;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Print every worker schema on the server, one per line.
pub async fn execute<B>(
    backend: &B,
    ctx: &CliContext,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    B: SchemaBackend + ?Sized,
{
    let schemas = backend.list_worker_schemas(&ctx.base_url).await?;

    if schemas.is_empty() {
        writeln!(out, "No worker schemas found.")?;
        return Ok(());
    }

    writeln!(out, "{:<10} Schema", "Worker")?;
    for schema in schemas {
        writeln!(out, "{:<10} {}", schema.worker_id(), schema)?;
    }
    Ok(())
}
