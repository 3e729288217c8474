use alloy::{
    rpc::json_rpc::{RequestPacket, ResponsePacket},
    transports::TransportError,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::{Duration, Instant},
};
use tower::{Layer, Service};
use tracing::{error, warn};

const SLOW_CALL_THRESHOLD: Duration = Duration::from_secs(10);

/// Logs slow and failed JSON-RPC calls made to one node.
#[derive(Clone)]
pub struct RpcLoggingLayer {
    rpc_url: String,
}

impl RpcLoggingLayer {
    pub fn new(rpc_url: String) -> Self {
        Self { rpc_url }
    }
}

impl<S> Layer<S> for RpcLoggingLayer {
    type Service = RpcLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RpcLoggingService { inner, rpc_url: self.rpc_url.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct RpcLoggingService<S> {
    inner: S,
    rpc_url: String,
}

#[derive(Debug, PartialEq, Eq)]
enum RpcFailureKind {
    Timeout,
    RateLimited,
    Connection,
    Other,
}

fn classify_failure(error_message: &str) -> RpcFailureKind {
    let lowered = error_message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") {
        RpcFailureKind::Timeout
    } else if lowered.contains("429") || lowered.contains("rate limit") {
        RpcFailureKind::RateLimited
    } else if lowered.contains("connection") || lowered.contains("network") {
        RpcFailureKind::Connection
    } else {
        RpcFailureKind::Other
    }
}

fn method_name(req: &RequestPacket) -> String {
    match req {
        RequestPacket::Single(r) => r.method().to_string(),
        RequestPacket::Batch(reqs) => match reqs.len() {
            0 => "empty_batch".to_string(),
            1 => reqs[0].method().to_string(),
            n => format!("batch_{}_requests", n),
        },
    }
}

impl<S> Service<RequestPacket> for RpcLoggingService<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let start_time = Instant::now();
        let rpc_url = self.rpc_url.clone();
        let method_name = method_name(&req);

        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;
            let duration = start_time.elapsed();

            match &result {
                Ok(_) if duration >= SLOW_CALL_THRESHOLD => {
                    warn!(
                        "SLOW RPC call - method: {}, duration: {:?}, url: {}",
                        method_name, duration, rpc_url
                    );
                }
                Ok(_) => {}
                Err(err) => match classify_failure(&err.to_string()) {
                    RpcFailureKind::Timeout => error!(
                        "RPC TIMEOUT - method: {}, duration: {:?}, url: {}, error: {}",
                        method_name, duration, rpc_url, err
                    ),
                    RpcFailureKind::RateLimited => error!(
                        "RPC RATE LIMITED - method: {}, duration: {:?}, url: {}, error: {}",
                        method_name, duration, rpc_url, err
                    ),
                    RpcFailureKind::Connection => error!(
                        "RPC CONNECTION ERROR - method: {}, duration: {:?}, url: {}, error: {}",
                        method_name, duration, rpc_url, err
                    ),
                    RpcFailureKind::Other => error!(
                        "RPC ERROR - method: {}, duration: {:?}, url: {}, error: {}",
                        method_name, duration, rpc_url, err
                    ),
                },
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        assert_eq!(classify_failure("request timed out"), RpcFailureKind::Timeout);
        assert_eq!(classify_failure("HTTP error 429"), RpcFailureKind::RateLimited);
        assert_eq!(classify_failure("Connection refused"), RpcFailureKind::Connection);
        assert_eq!(classify_failure("nonce too low"), RpcFailureKind::Other);
    }
}
