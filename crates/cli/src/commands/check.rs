use std::path::Path;

use consent_relay_core::{
    SETUP_FILE_NAME, TransactionSigner, common_types::ChainId, load_env_from_project_path, read,
    wallet::load_signer_from_signing_key,
};

use crate::{commands::error::CheckError, console::print_success_message};

pub fn handle_check(project_path: &Path) -> Result<(), CheckError> {
    let yaml_path = project_path.join(SETUP_FILE_NAME);
    if !yaml_path.exists() {
        return Err(CheckError::NotInitialized(format!("No {} found", SETUP_FILE_NAME)));
    }

    load_env_from_project_path(project_path);
    let config = read(&yaml_path, false)?;

    let chain_id = config.network.chain_id.unwrap_or_default();
    let signer = load_signer_from_signing_key(&config.signing_key, chain_id)?;

    print_success_message(&format!("{} is valid", SETUP_FILE_NAME));
    println!("  relay:            {}", config.name);
    println!(
        "  network:          {} ({} providers)",
        config.network.name,
        config.network.provider_urls.len()
    );
    println!("  chain id:         {}", describe_chain_id(config.network.chain_id));
    println!("  signing account:  {}", signer.address());
    println!("  contract:         {}", config.contract_address);
    println!("  queue backend:    {:?}", config.queue.backend);
    println!("  batch size:       {}", config.queue.batch_size);
    println!("  max attempts:     {}", config.queue.max_attempts);

    Ok(())
}

fn describe_chain_id(chain_id: Option<ChainId>) -> String {
    match chain_id {
        Some(chain_id) => chain_id.to_string(),
        None => "read from node on start".to_string(),
    }
}
