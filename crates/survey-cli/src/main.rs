//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use survey_cli::handlers::{check, fetch, mark_displayed, paths, reset, status};
use survey_cli::{Cli, CliConfig, CliError, Commands, bootstrap};

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli)?;

    if matches!(cli.command, Commands::Paths) {
        paths::execute(&config);
        return Ok(());
    }

    let ctx = bootstrap(config).await?;

    match cli.command {
        Commands::Paths => paths::execute(&ctx.config),
        Commands::Status { json } => status::execute(&ctx, json).await?,
        Commands::Check {
            no_consent,
            first_run,
            roll,
        } => {
            let options = check::CheckOptions {
                no_consent,
                first_run,
                roll,
            };
            check::execute(&ctx, options).await?;
        }
        Commands::Fetch => fetch::execute(&ctx).await?,
        Commands::MarkDisplayed => mark_displayed::execute(&ctx).await?,
        Commands::Reset { sampling } => reset::execute(&ctx, sampling).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
