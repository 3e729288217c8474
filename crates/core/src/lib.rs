pub mod gas;
mod logger;
pub use logger::{setup_info_logger, setup_logger};
mod shutdown;
pub use shutdown::{request_graceful_shutdown, shutdown_coordinator, ShutdownCoordinator};
mod postgres;
pub use postgres::{PostgresClient, PostgresConnectionError, PostgresError};
pub mod provider;
pub use provider::{ChainClient, ChainClientError, EvmChainClient};
pub mod queue_store;
pub use queue_store::{InMemoryQueueStore, PostgresQueueStore, QueueStore, QueueStoreError};
mod shared;
pub use shared::common_types;
mod startup;
pub use startup::{start, RunningRelay, StartError, SETUP_FILE_NAME};
mod environment;
pub mod transaction;
pub use transaction::{
    encoder::{encode_contract_call, EncodeContractCallError},
    queue_system::{
        start_transaction_relay, QueuedTransaction, RelaySetup, RelayState, RelayStatus,
        SendTransactionError, TransactionRelay,
    },
};
pub mod wallet;
pub use wallet::{LocalTransactionSigner, TransactionSigner, WalletError};
mod yaml;
pub use yaml::{
    read, NetworkSetupConfig, QueueBackend, QueueConfig, ReadYamlError, SetupConfig, SigningKey,
};

pub use environment::load_env_from_project_path;
pub use tracing::{error as relay_error, info as relay_info};
