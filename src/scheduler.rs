use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;

type Executor = Arc<dyn Fn() + Send + Sync>;

/// Debounced trigger for reconciliation passes.
///
/// Every [`request`](Self::request) supersedes the pending one: the previous
/// timer task is aborted and only the trailing request runs, once the delay
/// has elapsed without a newer request.
#[derive(Clone)]
pub struct ReconcileScheduler {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
    executor: Arc<RwLock<Option<Executor>>>,
    executed: Arc<AtomicU64>,
}

impl ReconcileScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Arc::new(Mutex::new(None)),
            executor: Arc::new(RwLock::new(None)),
            executed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_executor(&self, executor: Executor) {
        match self.executor.write() {
            Ok(mut writer) => *writer = Some(executor),
            Err(poisoned) => *poisoned.into_inner() = Some(executor),
        }
    }

    pub fn request(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("no async runtime available; reconciliation request dropped");
                return;
            }
        };

        let scheduler = self.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(scheduler.delay).await;
            if scheduler.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            scheduler.execute();
        });

        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Drops any pending request without running it.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// Number of debounced requests that actually ran.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    fn execute(&self) {
        let executor = self
            .executor
            .read()
            .map(|reader| reader.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
        self.executed.fetch_add(1, Ordering::SeqCst);
        match executor {
            Some(executor) => executor(),
            None => tracing::debug!("reconciliation requested before an executor was attached"),
        }
    }
}
