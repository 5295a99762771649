//! Single-flight token refresh.
//!
//! At most one refresh runs at a time. Callers that hit a 401 while a refresh
//! is outstanding are queued and released in arrival order with the same
//! outcome once it settles. Refresh tokens rotate server-side, so a second
//! concurrent refresh would present an already-spent token and log the user
//! out.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use menuhub_types::AuthFailure;
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// New access token, or the failure every waiter is rejected with.
pub type RefreshOutcome = Result<String, AuthFailure>;

type Waiter = Box<dyn FnOnce(&RefreshOutcome) + Send>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<Waiter>,
}

enum Entry {
    Leader(RefreshGuard),
    Waiting(oneshot::Receiver<RefreshOutcome>),
}

/// Owns the `IDLE`/`REFRESHING` state and the FIFO wait-list.
///
/// Construct one per session and share it behind an `Arc`.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    started: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Callers currently queued behind the outstanding refresh.
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Number of refreshes started since construction.
    pub fn refreshes_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Run `refresh` unless one is already in flight, in which case wait for
    /// that one instead.
    ///
    /// The refresh future runs on its own task: dropping or cancelling the
    /// caller that started it does not strand the queue, and if the task dies
    /// every waiter is released with a failure.
    pub async fn run_exclusive<F, Fut>(self: &Arc<Self>, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let guard = match self.enter() {
            Entry::Leader(guard) => guard,
            Entry::Waiting(rx) => {
                tracing::debug!("Refresh already in flight, waiting for it");
                return rx
                    .await
                    .unwrap_or_else(|_| Err(AuthFailure::refresh_failed("refresh abandoned")));
            },
        };

        self.started.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Starting token refresh");

        let task = refresh();
        let handle = tokio::spawn(async move {
            let outcome = task.await;
            guard.release(&outcome);
            outcome
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(AuthFailure::refresh_failed(e)),
        }
    }

    fn enter(self: &Arc<Self>) -> Entry {
        let mut state = self.state.lock();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(Box::new(move |outcome: &RefreshOutcome| {
                let _ = tx.send(outcome.clone());
            }));
            Entry::Waiting(rx)
        } else {
            state.refreshing = true;
            Entry::Leader(RefreshGuard { coordinator: Some(Arc::clone(self)) })
        }
    }

    fn finish(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.state.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        tracing::debug!(
            waiters = waiters.len(),
            success = outcome.is_ok(),
            "Releasing refresh waiters"
        );
        for waiter in waiters {
            waiter(outcome);
        }
    }
}

/// Held by the refresh task. Returns the coordinator to `IDLE` exactly once,
/// with a failure if the task is torn down before it reports.
struct RefreshGuard {
    coordinator: Option<Arc<RefreshCoordinator>>,
}

impl RefreshGuard {
    fn release(mut self, outcome: &RefreshOutcome) {
        if let Some(coordinator) = self.coordinator.take() {
            coordinator.finish(outcome);
        }
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            tracing::warn!("Refresh task ended without a result");
            coordinator.finish(&Err(AuthFailure::refresh_failed("refresh task aborted")));
        }
    }
}
