use std::{sync::Arc, time::Duration};

use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};
use tracing::{debug, info};

use super::types::{QueuedTransaction, RelayStatus, SendTransactionError};
use crate::{
    gas::GasLimit,
    queue_store::{QueueStore, QueueStoreError},
    shared::common_types::EvmAddress,
    shutdown::ShutdownCoordinator,
    transaction::{
        encoder::encode_contract_call,
        types::{TransactionData, TransactionMetadata, TransactionRequest},
    },
};

/// Handle request handlers use to queue transactions. Cheap to clone.
///
/// Sending only touches the queue store and nudges the worker, it never waits for the
/// transaction to be broadcast or mined.
#[derive(Clone)]
pub struct TransactionRelay {
    queue_store: Arc<dyn QueueStore>,
    contract_address: EvmAddress,
    signer_address: EvmAddress,
    wake_sender: mpsc::Sender<()>,
    status_receiver: watch::Receiver<RelayStatus>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl TransactionRelay {
    pub(super) fn new(
        queue_store: Arc<dyn QueueStore>,
        contract_address: EvmAddress,
        signer_address: EvmAddress,
        wake_sender: mpsc::Sender<()>,
        status_receiver: watch::Receiver<RelayStatus>,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Self {
        TransactionRelay {
            queue_store,
            contract_address,
            signer_address,
            wake_sender,
            status_receiver,
            shutdown,
        }
    }

    /// Queues a call to the configured contract.
    pub async fn send_transaction(
        &self,
        data: TransactionData,
        gas_limit: GasLimit,
        metadata: TransactionMetadata,
    ) -> Result<QueuedTransaction, SendTransactionError> {
        self.send_transaction_to(self.contract_address, data, gas_limit, metadata).await
    }

    pub async fn send_transaction_to(
        &self,
        destination: EvmAddress,
        data: TransactionData,
        gas_limit: GasLimit,
        metadata: TransactionMetadata,
    ) -> Result<QueuedTransaction, SendTransactionError> {
        let request = TransactionRequest::new(destination, data, gas_limit, metadata);
        let body = request.to_message_body()?;
        let message_id = self.queue_store.enqueue(&body).await?;

        info!("Queued {} as message {}", request.method_name(), message_id);
        self.wake();

        Ok(QueuedTransaction { message_id, body })
    }

    /// Encodes `signature` with `args` and queues it for the configured contract.
    ///
    /// ```ignore
    /// relay.send_contract_call(
    ///     "recordConsent(address,bytes32,bool)",
    ///     &["0x46988ba8250e009dcc5df543d78e2277e2aa900b", "0x01...", "true"],
    ///     GasLimit::new(200_000),
    ///     TransactionMetadata::default(),
    /// ).await?;
    /// ```
    pub async fn send_contract_call<S: AsRef<str>>(
        &self,
        signature: &str,
        args: &[S],
        gas_limit: GasLimit,
        metadata: TransactionMetadata,
    ) -> Result<QueuedTransaction, SendTransactionError> {
        let data = encode_contract_call(signature, args)?;
        self.send_transaction(data, gas_limit, metadata).await
    }

    /// Asks the worker to drain. Coalesces with any wake still pending.
    pub fn wake(&self) {
        match self.wake_sender.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => debug!("Relay worker has stopped, wake ignored"),
        }
    }

    pub fn status(&self) -> RelayStatus {
        *self.status_receiver.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<RelayStatus> {
        self.status_receiver.clone()
    }

    pub async fn queue_length(&self) -> Result<usize, QueueStoreError> {
        self.queue_store.approximate_length().await
    }

    pub fn signer_address(&self) -> EvmAddress {
        self.signer_address
    }

    pub fn contract_address(&self) -> EvmAddress {
        self.contract_address
    }

    /// Stops the worker once the batch it is processing, if any, has finished.
    ///
    /// # Returns
    /// * `false` - `timeout` elapsed while a batch was still running
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.shutdown.request_shutdown(timeout).await
    }
}
