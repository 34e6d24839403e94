use anyhow::Context;
use clap::CommandFactory;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pfhub::{Cli, Commands, ConfigManager, Dispatcher, Output, VerbosityLevel};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let output = Output::new();

    match run(cli, &output).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            output.emit_error(&format!("{:#}", err));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<u8> {
    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        println!();
        return Ok(0);
    };

    let config = ConfigManager::load_config(&cli)
        .await
        .context("loading configuration")?;
    init_logging(config.verbosity());

    let dispatcher = Dispatcher::from_config(&config)?;
    let outcome = match command {
        Commands::Download { url, dest } => dispatcher.download(&url, &dest).await?,
        Commands::DownloadMeta { url, dest } => dispatcher.download_meta(&url, &dest).await?,
        Commands::Convert { file_path, dest } => dispatcher.convert(&file_path, &dest).await?,
        Commands::ValidateOld { file_path } => dispatcher.validate_old(&file_path),
        Commands::Validate { file_path } => dispatcher.validate(&file_path).await?,
    };

    output.emit(&outcome)?;
    Ok(u8::try_from(outcome.exit_code()).unwrap_or(1))
}

/// Log to stderr so stdout carries only command output; `RUST_LOG` wins
fn init_logging(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
