// src/main.rs
// nixfuzz - generate, stage and validate NixOS configurations

use anyhow::Result;
use clap::Parser;
use nixfuzz::cli::{self, Cli, Commands};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".nixfuzz/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        match &cli.command {
            Commands::Run(_) => Level::INFO,
            _ => Level::WARN,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.config.as_deref();
    let ok = match cli.command {
        Commands::Run(args) => cli::run_session(config, args).await?,
        Commands::Generate {
            set,
            overrides,
            random,
            seed,
        } => {
            cli::run_generate(config, &set, &overrides, random, seed)?;
            true
        }
        Commands::Variants {
            axes,
            max_combinations,
        } => {
            cli::run_variants(&axes, max_combinations)?;
            true
        }
        Commands::Classify { input, test_name } => {
            cli::run_classify(input.as_deref(), &test_name)?;
            true
        }
        Commands::Check => cli::run_check(config)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
