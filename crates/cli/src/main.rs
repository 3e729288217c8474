use std::{env, path::PathBuf, str::FromStr};

use clap::Parser;

use crate::{
    cli_interface::{Cli, Commands},
    commands::{check, start},
    error::CliError,
};

mod cli_interface;
mod commands;
mod console;
pub use console::{print_error_message, print_success_message};

mod error;

fn resolve_path(override_path: &Option<String>) -> Result<PathBuf, String> {
    let path = match override_path {
        Some(path) => {
            PathBuf::from_str(path).map_err(|_| format!("Invalid path provided: '{}'", path))?
        }
        None => env::current_dir().map_err(|_| "Failed to get current directory.".to_string())?,
    };

    path.canonicalize().map_err(|e| format!("Failed to resolve path '{}': {}", path.display(), e))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Start { path, shutdown_timeout_seconds } => {
            let resolved_path = resolve_path(path).inspect_err(|e| print_error_message(e))?;

            start::handle_start(&resolved_path, *shutdown_timeout_seconds)
                .await
                .inspect_err(|e| print_error_message(&e.to_string()))?;
        }
        Commands::Check { path } => {
            let resolved_path = resolve_path(path).inspect_err(|e| print_error_message(e))?;

            check::handle_check(&resolved_path)
                .inspect_err(|e| print_error_message(&e.to_string()))?;
        }
    }

    Ok(())
}
