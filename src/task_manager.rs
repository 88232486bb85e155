//! Lifecycle of the daemon's background tasks.

use std::{future::Future, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a task may take to wind down after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct TaskInfo {
    name: String,
    handle: JoinHandle<Result<()>>,
}

/// Spawns named tasks that share one cancellation root.
pub struct TaskManager {
    tasks: Vec<TaskInfo>,
    root_token: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            root_token: CancellationToken::new(),
        }
    }

    /// Spawns `task_fn` with a child token that fires on [`Self::shutdown_all`].
    pub fn spawn_task<F, Fut>(&mut self, name: impl Into<String>, task_fn: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let token = self.root_token.child_token();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let result = task_fn(token).await;
            match &result {
                Ok(()) => info!("Task '{task_name}' finished"),
                Err(e) => error!("Task '{task_name}' failed: {e:#}"),
            }
            result
        });

        info!("Task '{name}' spawned");
        self.tasks.push(TaskInfo { name, handle });
    }

    /// Cancels every task and waits for them, returning the first failure.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping {} task(s)", self.tasks.len());
        self.root_token.cancel();

        let mut first_error = None;
        for TaskInfo { name, handle } in self.tasks.drain(..) {
            let outcome = match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join)) => Err(anyhow!("Task '{name}' panicked: {join}")),
                Err(_) => Err(anyhow!("Task '{name}' did not stop within {SHUTDOWN_TIMEOUT:?}")),
            };
            if let Err(e) = outcome {
                warn!("{e:#}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e).context("One or more tasks failed during shutdown"),
            None => {
                info!("All tasks stopped");
                Ok(())
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.handle.is_finished()).count()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.tasks
            .iter()
            .any(|t| t.name == name && !t.handle.is_finished())
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
