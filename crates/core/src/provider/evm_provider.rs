use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use alloy::{
    network::AnyNetwork,
    providers::{Provider, RootProvider},
    rpc::client::ClientBuilder,
    transports::{layers::RetryBackoffLayer, RpcError, TransportErrorKind},
};
use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tracing::warn;

use super::{layer_extensions::RpcLoggingLayer, ChainClient, ChainClientError};
use crate::{
    shared::common_types::{ChainId, EvmAddress},
    transaction::types::{RawTransaction, TransactionHash, TransactionNonce},
};

pub type RelayerProvider = RootProvider<AnyNetwork>;

const MAX_RATE_LIMIT_RETRIES: u32 = 10;
const INITIAL_BACKOFF_MS: u64 = 500;
const COMPUTE_UNITS_PER_SECOND: u64 = 660;

#[derive(Error, Debug)]
pub enum RetryClientError {
    #[error("http provider cant be created for {0}: {1}")]
    HttpProviderCantBeCreated(String, String),
}

pub fn create_retry_client(rpc_url: &str) -> Result<Arc<RelayerProvider>, RetryClientError> {
    let url = Url::parse(rpc_url).map_err(|e| {
        RetryClientError::HttpProviderCantBeCreated(rpc_url.to_string(), e.to_string())
    })?;

    let retry_layer =
        RetryBackoffLayer::new(MAX_RATE_LIMIT_RETRIES, INITIAL_BACKOFF_MS, COMPUTE_UNITS_PER_SECOND);
    let client = ClientBuilder::default()
        .layer(RpcLoggingLayer::new(rpc_url.to_string()))
        .layer(retry_layer)
        .http(url);

    Ok(Arc::new(RootProvider::<AnyNetwork>::new(client)))
}

/// Configured nodes with a sticky current node. Every call starts at the node that answered
/// last and only moves on when it cannot be reached, so a nonce read and the broadcast that
/// follows it land on the same node.
struct NodeSet<N> {
    nodes: Vec<(String, N)>,
    current: AtomicUsize,
}

impl<N: Clone> NodeSet<N> {
    fn new(nodes: Vec<(String, N)>) -> Self {
        NodeSet { nodes, current: AtomicUsize::new(0) }
    }

    fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    async fn call<T, F, Fut>(
        &self,
        chain: &str,
        method: &str,
        call: F,
    ) -> Result<T, ChainClientError>
    where
        F: Fn(N) -> Fut,
        Fut: Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let first = self.current();
        let mut last_error: Option<RpcError<TransportErrorKind>> = None;

        for offset in 0..self.nodes.len() {
            let index = (first + offset) % self.nodes.len();
            let (url, node) = &self.nodes[index];

            match call(node.clone()).await {
                Ok(result) => {
                    if index != first {
                        warn!("{} now using {} after {} failed", chain, url, method);
                        self.current.store(index, Ordering::SeqCst);
                    }
                    return Ok(result);
                }
                Err(RpcError::Transport(kind)) => {
                    warn!(
                        "{} on {} via {} failed at transport level: {} - trying next node",
                        method, chain, url, kind
                    );
                    last_error = Some(RpcError::Transport(kind));
                }
                Err(e) => return Err(ChainClientError::Rpc(e)),
            }
        }

        Err(last_error.map(ChainClientError::Rpc).unwrap_or(ChainClientError::NoProviders))
    }
}

/// Highest nonce each sender has had accepted through this client.
///
/// After a switch the new node's pending pool may not have seen what the old node accepted
/// yet, so a pending count below the floor is raised to it. The floor lives in memory only;
/// after a restart the node is trusted again.
#[derive(Default)]
struct BroadcastFloor {
    accepted: Mutex<HashMap<EvmAddress, TransactionNonce>>,
}

impl BroadcastFloor {
    fn record(&self, sender: &EvmAddress, nonce: TransactionNonce) {
        let mut accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = accepted.entry(*sender).or_insert(nonce);
        if nonce > *entry {
            *entry = nonce;
        }
    }

    fn apply(&self, address: &EvmAddress, pending: TransactionNonce) -> TransactionNonce {
        let accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        match accepted.get(address) {
            Some(last) if *last >= pending => {
                let raised = *last + 1;
                warn!(
                    "pending nonce {} for {} is behind accepted nonce {}, using {}",
                    pending, address, last, raised
                );
                raised
            }
            _ => pending,
        }
    }
}

/// JSON-RPC chain client. Nodes are tried in configured order; the next node is only used
/// when the current one could not be reached.
#[derive(Clone)]
pub struct EvmChainClient {
    nodes: Arc<NodeSet<Arc<RelayerProvider>>>,
    floor: Arc<BroadcastFloor>,
    pub name: String,
    pub provider_urls: Vec<String>,
}

impl EvmChainClient {
    pub fn new(name: &str, provider_urls: &[String]) -> Result<Self, ChainClientError> {
        if provider_urls.is_empty() {
            return Err(ChainClientError::NoProviders);
        }

        let nodes = provider_urls
            .iter()
            .map(|url| {
                let client = create_retry_client(url).map_err(|e| {
                    ChainClientError::ProviderCantBeCreated(url.clone(), e.to_string())
                })?;
                Ok::<_, ChainClientError>((url.clone(), client))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EvmChainClient {
            nodes: Arc::new(NodeSet::new(nodes)),
            floor: Arc::new(BroadcastFloor::default()),
            name: name.to_string(),
            provider_urls: provider_urls.to_vec(),
        })
    }

    pub async fn chain_id(&self) -> Result<ChainId, ChainClientError> {
        let chain_id = self
            .nodes
            .call(&self.name, "eth_chainId", |p| async move { p.get_chain_id().await })
            .await?;
        Ok(ChainId::new(chain_id))
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn next_nonce(&self, address: &EvmAddress) -> Result<TransactionNonce, ChainClientError> {
        let account = address.into_address();
        let pending = self
            .nodes
            .call(&self.name, "eth_getTransactionCount", |p| async move {
                p.get_transaction_count(account).pending().await
            })
            .await?;

        Ok(self.floor.apply(address, TransactionNonce::new(pending)))
    }

    async fn broadcast(
        &self,
        raw_transaction: &RawTransaction,
    ) -> Result<TransactionHash, ChainClientError> {
        let bytes = raw_transaction.bytes().clone();
        let tx_hash = self
            .nodes
            .call(&self.name, "eth_sendRawTransaction", |p| {
                let bytes = bytes.clone();
                async move {
                    let pending = p.send_raw_transaction(&bytes).await?;
                    Ok::<_, RpcError<TransportErrorKind>>(*pending.tx_hash())
                }
            })
            .await?;

        self.floor.record(raw_transaction.sender(), raw_transaction.nonce());
        Ok(TransactionHash::from_alloy_hash(&tx_hash))
    }
}
