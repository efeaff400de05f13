//! livemeasure CLI - incremental live measure recomputation
//!
//! Recomputes measures and quality gate status for touched components of a
//! dataset file and reports the resulting change events.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging; RUST_LOG wins over flags and config
    let logging = cli::logging_settings(&cli);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    // Execute command
    match cli.command {
        Commands::Recompute(args) => {
            cli::recompute(args).await?;
        }
        Commands::Formulas => {
            cli::list_formulas().await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args).await?;
        }
    }

    Ok(())
}
