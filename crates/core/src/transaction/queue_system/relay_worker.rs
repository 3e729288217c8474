use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use super::types::{RelayMessageError, RelaySetup, RelayState, RelayStatus};
use crate::{
    provider::ChainClient,
    queue_store::{LeasedMessage, QueueStore},
    shutdown::ShutdownCoordinator,
    transaction::types::{TransactionHash, TransactionRequest},
    wallet::TransactionSigner,
};

enum BatchOutcome {
    Finished,
    Redrain,
}

/// Drains the queue for one signing account.
///
/// Exactly one worker runs per account and it processes a single message at a time, so two
/// nonce lookups for the account never overlap. Wake signals that arrive mid drain wait in
/// the channel and cause at most one more pass once the current one is done.
pub struct RelayWorker {
    queue_store: Arc<dyn QueueStore>,
    chain_client: Arc<dyn ChainClient>,
    signer: Arc<dyn TransactionSigner>,
    setup: RelaySetup,
    status_sender: watch::Sender<RelayStatus>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl RelayWorker {
    pub fn new(
        queue_store: Arc<dyn QueueStore>,
        chain_client: Arc<dyn ChainClient>,
        signer: Arc<dyn TransactionSigner>,
        setup: RelaySetup,
        status_sender: watch::Sender<RelayStatus>,
        shutdown: Arc<ShutdownCoordinator>,
    ) -> Self {
        RelayWorker { queue_store, chain_client, signer, setup, status_sender, shutdown }
    }

    /// Runs until shutdown is requested or every wake sender is dropped.
    pub async fn run(self, mut wake_receiver: mpsc::Receiver<()>) {
        let mut shutdown_signal = self.shutdown.subscribe();
        info!(
            "Relay worker started for {} (batch size {}, max attempts {})",
            self.signer.address(),
            self.setup.batch_size,
            self.setup.max_attempts
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signal.requested() => break,
                wake = wake_receiver.recv() => match wake {
                    Some(()) => self.drain().await,
                    None => break,
                },
            }
        }

        info!("Relay worker for {} stopped", self.signer.address());
    }

    /// One wake: keeps leasing batches until the queue has nothing visible left.
    async fn drain(&self) {
        let Some(_guard) = self.shutdown.enter_operation() else {
            return;
        };

        self.status_sender.send_modify(|status| status.state = RelayState::Draining);

        loop {
            let outcome = match AssertUnwindSafe(self.process_batch()).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    error!("Relay drain cycle panicked: {}", panic_message(panic.as_ref()));
                    BatchOutcome::Finished
                }
            };

            self.status_sender.send_modify(|status| status.completed_drain_cycles += 1);

            match outcome {
                BatchOutcome::Redrain if !self.shutdown.is_shutdown_requested() => continue,
                _ => break,
            }
        }

        self.status_sender.send_modify(|status| status.state = RelayState::Idle);
    }

    async fn process_batch(&self) -> BatchOutcome {
        let leased = match self.queue_store.lease_batch(self.setup.batch_size).await {
            Ok(leased) => leased,
            Err(e) => {
                warn!("Could not lease messages from the queue, will retry on next wake: {}", e);
                return BatchOutcome::Finished;
            }
        };

        if leased.is_empty() {
            return BatchOutcome::Finished;
        }

        // a panic stays with the message that caused it, the rest of the batch still runs
        for message in leased {
            let message_id = message.handle.message_id;
            if let Err(panic) = AssertUnwindSafe(self.relay_message(message)).catch_unwind().await {
                error!(
                    "Relaying message {} panicked, it stays queued: {}",
                    message_id,
                    panic_message(panic.as_ref())
                );
            }
        }

        match self.queue_store.approximate_length().await {
            Ok(0) => BatchOutcome::Finished,
            Ok(remaining) => {
                info!("{} messages still queued, starting another batch", remaining);
                BatchOutcome::Redrain
            }
            Err(e) => {
                warn!("Could not read queue length after batch: {}", e);
                BatchOutcome::Finished
            }
        }
    }

    async fn relay_message(&self, message: LeasedMessage) {
        let mut request = match TransactionRequest::from_message_body(&message.body) {
            Ok(request) => request,
            Err(e) => {
                let error = RelayMessageError::Malformed(e);
                error!("Message {} can never be relayed: {}", message.handle.message_id, error);
                self.dead_letter(&message, &error).await;
                return;
            }
        };

        match self.submit(&request).await {
            Ok(hash) => {
                info!(
                    "Relayed {} for message {} as transaction {}",
                    request.method_name(),
                    message.handle.message_id,
                    hash
                );

                // already on chain, a failed delete must not lead to a second broadcast here
                if let Err(e) = self.queue_store.delete(&message.handle).await {
                    error!(
                        "Transaction {} was broadcast but message {} could not be deleted: {}",
                        hash, message.handle.message_id, e
                    );
                }
            }
            Err(e) => {
                let attempt = request.record_failed_attempt().max(message.receive_count);

                if attempt >= self.setup.max_attempts {
                    error!(
                        "Giving up on {} for message {} after {} attempts: {} - metadata {}",
                        request.method_name(),
                        message.handle.message_id,
                        attempt,
                        e,
                        request.metadata
                    );
                    self.dead_letter(&message, &e).await;
                } else {
                    warn!(
                        "Could not relay {} for message {} (attempt {}/{}), leaving it queued: {} - metadata {}",
                        request.method_name(),
                        message.handle.message_id,
                        attempt,
                        self.setup.max_attempts,
                        e,
                        request.metadata
                    );
                }
            }
        }
    }

    async fn submit(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionHash, RelayMessageError> {
        let nonce = self
            .chain_client
            .next_nonce(&self.signer.address())
            .await
            .map_err(RelayMessageError::Nonce)?;

        let raw_transaction =
            self.signer.sign(nonce, &request.destination, &request.data, request.gas_limit)?;

        self.chain_client.broadcast(&raw_transaction).await.map_err(RelayMessageError::Broadcast)
    }

    async fn dead_letter(&self, message: &LeasedMessage, reason: &RelayMessageError) {
        if let Err(e) = self.queue_store.dead_letter(&message.handle, &reason.to_string()).await {
            error!("Could not dead-letter message {}: {}", message.handle.message_id, e);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
