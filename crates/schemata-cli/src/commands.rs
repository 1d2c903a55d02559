//! Subcommands of the `schemata` binary.

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the scoped connection URL a worker would use
    Target {
        /// Worker identity (defaults to SCHEMATA_WORKER_ID, then "0")
        #[arg(short, long)]
        worker: Option<String>,
        /// How to encode the schema: a query parameter name or "search-path"
        #[arg(short, long)]
        selector: Option<String>,
        /// Mask the password in the printed URL
        #[arg(long)]
        redact: bool,
    },

    /// List existing worker schemas
    List,

    /// Drop worker schemas left behind by killed test runs
    Sweep {
        /// Worker whose schema must be kept (repeatable)
        #[arg(short, long = "keep", value_name = "WORKER")]
        keep: Vec<String>,
        /// Only report what would be dropped
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use crate::Cli;
    use crate::commands::Commands;
    use clap::Parser;

    #[test]
    fn test_target_args() {
        let cli = Cli::parse_from(["schemata", "target", "-w", "7", "--selector", "search-path"]);
        match cli.command {
            Commands::Target {
                worker,
                selector,
                redact,
            } => {
                assert_eq!(worker.as_deref(), Some("7"));
                assert_eq!(selector.as_deref(), Some("search-path"));
                assert!(!redact);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_sweep_repeated_keep() {
        let cli = Cli::parse_from([
            "schemata", "sweep", "--keep", "1", "-k", "2", "--dry-run", "--json",
        ]);
        match cli.command {
            Commands::Sweep {
                keep,
                dry_run,
                json,
            } => {
                assert_eq!(keep, vec!["1", "2"]);
                assert!(dry_run);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
