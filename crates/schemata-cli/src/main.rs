//! CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use schemata_cli::{Cli, CliError, Commands, ConfigOverrides, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Target {
            worker,
            selector,
            redact,
        } => {
            let overrides = ConfigOverrides {
                database_url: cli.database_url,
                worker,
                selector,
            };
            let config = schemata_cli::resolve_fixture_config(&overrides, |key| {
                std::env::var(key).ok()
            })
            .map_err(CliError::from)?;
            handlers::target::execute(&config, redact, &mut stdout)?;
        }
        Commands::List => {
            let ctx = bootstrap(cli.database_url.as_deref()).map_err(CliError::from)?;
            handlers::list::execute(&ctx.backend, &ctx, &mut stdout).await?;
        }
        Commands::Sweep {
            keep,
            dry_run,
            json,
        } => {
            let ctx = bootstrap(cli.database_url.as_deref()).map_err(CliError::from)?;
            let report =
                handlers::sweep::execute(&ctx.backend, &ctx, &keep, dry_run, json, &mut stdout)
                    .await?;
            if !report.failed.is_empty() {
                return Err(CliError::Database(format!(
                    "{} schema(s) could not be dropped",
                    report.failed.len()
                ))
                .into());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads DATABASE_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}
