use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use once_cell::sync::Lazy;
use tokio::sync::{watch, Notify};
use tracing::{info, warn};

use crate::logger::mark_shutdown_started;

static SHUTDOWN_COORDINATOR: Lazy<Arc<ShutdownCoordinator>> =
    Lazy::new(|| Arc::new(ShutdownCoordinator::new()));

/// Stop signal plus a count of operations (drain cycles) that shutdown has to wait for.
///
/// The signal is a `watch` flag rather than an event, so a task that subscribes after
/// shutdown was requested still sees it.
pub struct ShutdownCoordinator {
    requested: watch::Sender<bool>,
    in_flight: AtomicUsize,
    all_finished: Notify,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (requested, _) = watch::channel(false);
        ShutdownCoordinator {
            requested,
            in_flight: AtomicUsize::new(0),
            all_finished: Notify::new(),
        }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal(self.requested.subscribe())
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.requested.borrow()
    }

    /// Returns `None` once shutdown has been requested, the caller must not start new work.
    pub fn enter_operation(self: &Arc<Self>) -> Option<OperationGuard> {
        // count first so a concurrent request_shutdown either sees this operation or has
        // already raised the flag we check next
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = OperationGuard { coordinator: Arc::clone(self) };

        if self.is_shutdown_requested() {
            return None;
        }
        Some(guard)
    }

    pub fn active_operations_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Raises the stop signal and waits up to `timeout` for in-flight operations.
    ///
    /// # Returns
    /// * `true` - Nothing was left running
    /// * `false` - The timeout elapsed first
    pub async fn request_shutdown(&self, timeout: Duration) -> bool {
        self.requested.send_replace(true);
        info!("Shutdown requested with {} operations in flight", self.active_operations_count());

        match tokio::time::timeout(timeout, self.all_operations_finished()).await {
            Ok(()) => {
                info!("All operations finished, shutting down");
                true
            }
            Err(_) => {
                warn!(
                    "Gave up waiting after {:?}, {} operations still in flight",
                    timeout,
                    self.active_operations_count()
                );
                false
            }
        }
    }

    async fn all_operations_finished(&self) {
        loop {
            let finished = self.all_finished.notified();
            if self.active_operations_count() == 0 {
                return;
            }
            finished.await;
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once shutdown has been requested, straight away if it already was.
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub async fn requested(&mut self) {
        // Err means the coordinator was dropped, treat it as a stop request
        let _ = self.0.wait_for(|requested| *requested).await;
    }
}

/// Held for the length of one operation. Dropping it, even while unwinding, ends the operation.
pub struct OperationGuard {
    coordinator: Arc<ShutdownCoordinator>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        if self.coordinator.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.coordinator.all_finished.notify_waiters();
        }
    }
}

/// Process wide coordinator the CLI shuts down on Ctrl-C.
pub fn shutdown_coordinator() -> Arc<ShutdownCoordinator> {
    Arc::clone(&SHUTDOWN_COORDINATOR)
}

pub async fn request_graceful_shutdown(timeout: Duration) -> bool {
    mark_shutdown_started();
    shutdown_coordinator().request_shutdown(timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_waits_for_running_drain_before_reporting_clean_shutdown() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let drain = coordinator.enter_operation().unwrap();

        let waiting = coordinator.clone();
        let shutdown = tokio::spawn(async move {
            waiting.request_shutdown(Duration::from_secs(5)).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!shutdown.is_finished());
        assert!(coordinator.enter_operation().is_none());

        drop(drain);
        assert!(shutdown.await.unwrap());
        assert_eq!(coordinator.active_operations_count(), 0);
    }

    #[tokio::test]
    async fn test_reports_timeout_when_operation_never_finishes() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let _stuck = coordinator.enter_operation().unwrap();

        assert!(!coordinator.request_shutdown(Duration::from_millis(20)).await);
        assert_eq!(coordinator.active_operations_count(), 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_still_sees_request() {
        let coordinator = ShutdownCoordinator::new();
        assert!(coordinator.request_shutdown(Duration::from_millis(10)).await);

        let mut signal = coordinator.subscribe();
        let seen = tokio::time::timeout(Duration::from_millis(100), signal.requested()).await;
        assert!(seen.is_ok());
    }

    #[tokio::test]
    async fn test_refused_operation_leaves_no_count_behind() {
        let coordinator = Arc::new(ShutdownCoordinator::new());
        let running = coordinator.enter_operation().unwrap();
        coordinator.requested.send_replace(true);

        assert!(coordinator.enter_operation().is_none());
        assert_eq!(coordinator.active_operations_count(), 1);

        drop(running);
        assert!(coordinator.request_shutdown(Duration::from_millis(50)).await);
        assert_eq!(coordinator.active_operations_count(), 0);
    }

    #[test]
    fn test_operations_racing_shutdown_are_counted_or_refused() {
        for _ in 0..200 {
            let coordinator = Arc::new(ShutdownCoordinator::new());
            let entering = coordinator.clone();
            let drain = std::thread::spawn(move || entering.enter_operation());

            coordinator.requested.send_replace(true);
            let counted_at_shutdown = coordinator.active_operations_count();
            let guard = drain.join().unwrap();

            // an operation that got in was visible to shutdown when it looked
            if guard.is_some() {
                assert_eq!(counted_at_shutdown, 1);
            }
        }
    }
}
