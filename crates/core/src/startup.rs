use std::{path::Path, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    environment::load_env_from_project_path,
    postgres::{PostgresClient, PostgresConnectionError, PostgresError},
    provider::{ChainClientError, EvmChainClient},
    queue_store::{InMemoryQueueStore, PostgresQueueStore, QueueStore},
    setup_info_logger,
    shared::common_types::ChainId,
    shutdown::{request_graceful_shutdown, shutdown_coordinator},
    transaction::queue_system::{start_transaction_relay, RelaySetup, TransactionRelay},
    wallet::{load_signer_from_signing_key, TransactionSigner, WalletError},
    yaml::{read, QueueBackend, ReadYamlError, SetupConfig},
};

pub const SETUP_FILE_NAME: &str = "relay.yaml";

#[derive(Error, Debug)]
pub enum StartError {
    #[error("Failed to find {0} in the project directory")]
    NoYamlFileFound(String),

    #[error("{0}")]
    ReadYamlError(#[from] ReadYamlError),

    #[error("Could not load the signing key: {0}")]
    SigningKeyError(#[from] WalletError),

    #[error("Could not reach the chain: {0}")]
    ChainClientError(#[from] ChainClientError),

    #[error("Network {network} is configured as chain {configured} but the node reports chain {node}")]
    ChainIdMismatch { network: String, configured: ChainId, node: ChainId },

    #[error("Failed to connect to the database: {0}")]
    DatabaseConnectionError(#[from] PostgresConnectionError),

    #[error("Could not apply queue schema to postgres: {0}")]
    CouldNotApplyQueueSchema(#[from] PostgresError),
}

/// A relay started from a project directory. Keep it alive for as long as the relay should run.
pub struct RunningRelay {
    relay: TransactionRelay,
    worker: JoinHandle<()>,
    config: SetupConfig,
}

impl RunningRelay {
    pub fn relay(&self) -> &TransactionRelay {
        &self.relay
    }

    pub fn config(&self) -> &SetupConfig {
        &self.config
    }

    /// Waits up to `timeout` for an in-flight drain cycle, then stops the worker.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        let graceful = request_graceful_shutdown(timeout).await;

        if tokio::time::timeout(timeout, self.worker).await.is_err() {
            warn!("Relay worker did not stop within {:?}", timeout);
            return false;
        }

        info!("Relay {} stopped", self.config.name);
        graceful
    }
}

async fn resolve_chain_id(
    config: &SetupConfig,
    chain_client: &EvmChainClient,
) -> Result<ChainId, StartError> {
    let node_chain_id = chain_client.chain_id().await?;

    match config.network.chain_id {
        Some(configured) if configured != node_chain_id => Err(StartError::ChainIdMismatch {
            network: config.network.name.clone(),
            configured,
            node: node_chain_id,
        }),
        _ => Ok(node_chain_id),
    }
}

async fn create_queue_store(config: &SetupConfig) -> Result<Arc<dyn QueueStore>, StartError> {
    let visibility_timeout = Duration::from_secs(config.queue.visibility_timeout_seconds);

    match config.queue.backend {
        QueueBackend::Memory => {
            warn!("Using the in-memory queue, queued transactions are lost on restart");
            Ok(Arc::new(InMemoryQueueStore::new(visibility_timeout)))
        }
        QueueBackend::Postgres => {
            let postgres = Arc::new(PostgresClient::new().await?);
            let store = PostgresQueueStore::new(postgres, &config.name, visibility_timeout);
            store.apply_schema().await?;
            info!("Applied queue schema");
            Ok(Arc::new(store))
        }
    }
}

/// Starts the relay described by `relay.yaml` in `project_path`.
pub async fn start(project_path: &Path) -> Result<RunningRelay, StartError> {
    setup_info_logger();
    load_env_from_project_path(project_path);

    info!("Starting up the relay");

    let yaml_path = project_path.join(SETUP_FILE_NAME);
    if !yaml_path.exists() {
        error!("Could not find {} in {}", SETUP_FILE_NAME, project_path.display());
        return Err(StartError::NoYamlFileFound(SETUP_FILE_NAME.to_string()));
    }

    let config = read(&yaml_path, false)?;

    let chain_client = EvmChainClient::new(&config.network.name, &config.network.provider_urls)?;
    let chain_id = resolve_chain_id(&config, &chain_client).await?;
    info!("Connected to {} (chain {})", config.network.name, chain_id);

    let signer = load_signer_from_signing_key(&config.signing_key, chain_id)?;
    info!("Relay signing account is {}", signer.address());

    let queue_store = create_queue_store(&config).await?;

    let (relay, worker) = start_transaction_relay(
        queue_store,
        Arc::new(chain_client),
        Arc::new(signer),
        RelaySetup::from_queue_config(config.contract_address, &config.queue),
        shutdown_coordinator(),
    );

    info!("Relay {} is up", config.name);

    Ok(RunningRelay { relay, worker, config })
}
