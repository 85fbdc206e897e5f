//! Titanic survival - command-line entry point

use clap::Parser;
use titanic_survival::cli::{cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "titanic_survival=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, output, config, seed } => {
            cmd_train(&data, &output, config.as_deref(), seed)?;
        }
        Commands::Predict { artifacts, variant, data, output } => {
            cmd_predict(&artifacts, variant.as_deref(), &data, &output)?;
        }
    }

    Ok(())
}
