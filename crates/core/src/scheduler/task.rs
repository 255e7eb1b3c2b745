use async_trait::async_trait;
use tokio::sync::watch;

use super::job::JobHandle;

/// Work the scheduler runs each time a job's cron expression fires.
///
/// Every firing runs on its own spawned task, so `run` may be entered again
/// while an earlier call is still in flight; implementations guard against
/// that themselves if they need to.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Name used for logging.
    fn name(&self) -> &str;

    /// Execute one firing.
    async fn run(&self, ctx: TaskContext);
}

/// Per-firing context handed to [`ScheduledTask::run`].
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// The job that fired.
    pub job: JobHandle,
    shutdown: watch::Receiver<bool>,
}

impl TaskContext {
    pub fn new(job: JobHandle, shutdown: watch::Receiver<bool>) -> Self {
        Self { job, shutdown }
    }

    /// Resolves once process shutdown has been requested.
    pub async fn shutdown_requested(&mut self) {
        wait_for_shutdown(&mut self.shutdown).await;
    }
}

/// Wait until the shutdown flag flips to `true` or its sender goes away.
pub(crate) async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}
