//! Target command handler.

use std::io::Write;

use schemata_core::FixtureConfig;

use crate::error::CliError;

/// Print the scoped URL for `config`.
pub fn execute(config: &FixtureConfig, redact: bool, out: &mut impl Write) -> Result<(), CliError> {
    let target = config.target();
    let url = if redact { target.redacted() } else { target.url() };
    writeln!(out, "{url}")?;
    Ok(())
}
