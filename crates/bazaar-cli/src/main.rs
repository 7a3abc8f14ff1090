//! Bazaar CLI - find, save and submit Ramadan bazaars from the terminal
//!
//! Favorites are stored on this device first and mirrored to the backend
//! while signed in.

mod auth;
mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::bazaars::run_bazaars;
use crate::commands::common::{default_config_path, AppContext};
use crate::commands::completions::run_completions;
use crate::commands::config::{run_config_init, run_config_show};
use crate::commands::favorites::run_favorites;
use crate::commands::reports::run_reports;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env();
    let filter = match "bazaar=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
        Commands::Config {
            command:
                ConfigCommands::Init {
                    pocketbase_url,
                    cloud_sync,
                    db_path,
                },
        } => {
            let config_path = match cli.config {
                Some(path) => path,
                None => default_config_path()?,
            };
            run_config_init(&config_path, pocketbase_url, cloud_sync, db_path)
        }
        Commands::Config {
            command: ConfigCommands::Show { json },
        } => run_config_show(&AppContext::load(cli.config, cli.db_path)?, json),
        Commands::Bazaars { command } => {
            run_bazaars(command, &AppContext::load(cli.config, cli.db_path)?).await
        }
        Commands::Favorites { command } => {
            run_favorites(command, &AppContext::load(cli.config, cli.db_path)?).await
        }
        Commands::Auth { command } => {
            run_auth(command, &AppContext::load(cli.config, cli.db_path)?).await
        }
        Commands::Reports { command } => {
            run_reports(command, &AppContext::load(cli.config, cli.db_path)?).await
        }
    }
}
