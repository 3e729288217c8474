use std::{path::Path, time::Duration};

use consent_relay_core::{SETUP_FILE_NAME, relay_error, relay_info, start};

use crate::{commands::error::ProjectStartupError, console::print_warn_message};

pub async fn handle_start(
    project_path: &Path,
    shutdown_timeout_seconds: u64,
) -> Result<(), ProjectStartupError> {
    if !project_path.join(SETUP_FILE_NAME).exists() {
        return Err(ProjectStartupError::NotInitialized(format!(
            "No {} found. Please run this command from your project root.",
            SETUP_FILE_NAME
        )));
    }

    let running = start(project_path).await?;
    relay_info!(
        "Relaying from {} to {} - press Ctrl-C to stop",
        running.relay().signer_address(),
        running.relay().contract_address()
    );

    let signal = tokio::signal::ctrl_c().await;

    relay_info!("Shutting down the relay...");
    if !running.shutdown(Duration::from_secs(shutdown_timeout_seconds)).await {
        relay_error!("Relay did not shut down cleanly, unfinished messages will be retried");
        print_warn_message("Shutdown timed out, a drain cycle was still running");
    }

    signal?;
    Ok(())
}
