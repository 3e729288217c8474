use std::time::Duration;

use crate::{
    shared::common_types::EvmAddress,
    yaml::{QueueConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS},
};

#[derive(Debug, Clone)]
pub struct RelaySetup {
    /// Destination used by `send_transaction`.
    pub contract_address: EvmAddress,
    pub batch_size: usize,
    /// A message leased this many times that fails again is dead-lettered.
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl RelaySetup {
    pub fn new(contract_address: EvmAddress) -> Self {
        RelaySetup {
            contract_address,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn from_queue_config(contract_address: EvmAddress, queue: &QueueConfig) -> Self {
        RelaySetup {
            contract_address,
            batch_size: queue.batch_size,
            max_attempts: queue.max_attempts,
            poll_interval: Duration::from_millis(queue.poll_interval_ms),
        }
    }
}
