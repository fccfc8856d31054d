//! ridesched CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use ridesched_core::{TracingConfig, init_tracing};

use ridesched_cli::cli::{Cli, Command, ConfigAction};
use ridesched_cli::commands;
use ridesched_cli::config::ClientConfig;
use ridesched_cli::error::{ClientError, ClientResult};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.json_logs {
        TracingConfig::unattended()
    } else if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ClientResult<()> {
    let path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if cli.config.is_some() {
        ClientConfig::load_from(&path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&path),
        },
        Command::ExpiryTag { date, days } => {
            commands::route::expiry_tag(&date, days.unwrap_or(config.expiry.days))
        }
        Command::Login => commands::login(&mut commands::connect(&config)?),
        Command::Event { action } => commands::event::run(&mut commands::connect(&config)?, action),
        Command::Route { action } => commands::route::run(&mut commands::connect(&config)?, action),
    }
}
