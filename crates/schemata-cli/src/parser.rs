//! Root CLI parser and global options.

use clap::Parser;

use crate::commands::Commands;

/// Inspect and clean up per-worker test schemas.
#[derive(Parser)]
#[command(name = "schemata")]
#[command(about = "Inspect and clean up per-worker test schemas")]
#[command(version)]
pub struct Cli {
    /// Base connection URL of the test database
    #[arg(long = "database-url", env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "schemata",
            "list",
            "--verbose",
            "--database-url",
            "postgres://localhost/yourdb_test",
        ]);
        assert!(cli.verbose);
        assert_eq!(
            cli.database_url.as_deref(),
            Some("postgres://localhost/yourdb_test")
        );
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["schemata"]).is_err());
    }
}
