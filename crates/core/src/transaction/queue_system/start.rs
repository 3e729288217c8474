use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::info;

use super::{
    relay_worker::RelayWorker,
    transaction_relay::TransactionRelay,
    types::{RelaySetup, RelayStatus},
};
use crate::{
    provider::ChainClient, queue_store::QueueStore, shutdown::ShutdownCoordinator,
    wallet::TransactionSigner,
};

/// Periodically wakes the worker so messages whose broadcast failed are retried once their
/// visibility timeout runs out, even when nothing new is being queued.
fn spawn_retry_ticker(
    relay: TransactionRelay,
    period: Duration,
    shutdown: Arc<ShutdownCoordinator>,
) {
    let period = period.max(Duration::from_millis(1));
    let mut shutdown_signal = shutdown.subscribe();

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_signal.requested() => break,
                _ = ticker.tick() => relay.wake(),
            }
        }
    });
}

/// Spawns the worker for the signer's account plus its retry ticker and queues an initial
/// wake so work left over from a previous process is picked up.
///
/// Only one relay may run per signing account, two workers would race each other's nonces.
pub fn start_transaction_relay(
    queue_store: Arc<dyn QueueStore>,
    chain_client: Arc<dyn ChainClient>,
    signer: Arc<dyn TransactionSigner>,
    setup: RelaySetup,
    shutdown: Arc<ShutdownCoordinator>,
) -> (TransactionRelay, JoinHandle<()>) {
    let (wake_sender, wake_receiver) = mpsc::channel(1);
    let (status_sender, status_receiver) = watch::channel(RelayStatus::default());

    let relay = TransactionRelay::new(
        queue_store.clone(),
        setup.contract_address,
        signer.address(),
        wake_sender,
        status_receiver,
        shutdown.clone(),
    );

    info!(
        "Starting transaction relay for {} on chain {} sending to {}",
        signer.address(),
        signer.chain_id(),
        setup.contract_address
    );

    let poll_interval = setup.poll_interval;
    let worker =
        RelayWorker::new(queue_store, chain_client, signer, setup, status_sender, shutdown.clone());
    let worker_handle = tokio::spawn(worker.run(wake_receiver));

    spawn_retry_ticker(relay.clone(), poll_interval, shutdown);
    relay.wake();

    (relay, worker_handle)
}
