//! Busy-gated wrapper around a user-triggered asynchronous operation.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use tokio::sync::watch;

type Operation = dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;
type Predicate = dyn Fn() -> bool + Send + Sync;

/// Snapshot published to observers on every running-flag transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub running: bool,
    pub can_run: bool,
}

/// Runs at most one invocation of its operation at a time.
///
/// Triggers that arrive while an invocation is in flight are dropped, not
/// queued. Errors never escape: they are logged and the running flag is reset.
/// Cloning yields a handle to the same command.
#[derive(Clone)]
pub struct AsyncCommand {
    inner: Arc<Inner>,
}

struct Inner {
    name: &'static str,
    operation: Box<Operation>,
    predicate: Option<Box<Predicate>>,
    running: AtomicBool,
    status: watch::Sender<CommandStatus>,
}

impl AsyncCommand {
    pub fn new<F, Fut>(name: &'static str, operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::build(name, operation, None)
    }

    /// Command that is only eligible to run while `predicate` holds.
    pub fn with_predicate<F, Fut, P>(name: &'static str, operation: F, predicate: P) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        P: Fn() -> bool + Send + Sync + 'static,
    {
        Self::build(name, operation, Some(Box::new(predicate)))
    }

    fn build<F, Fut>(name: &'static str, operation: F, predicate: Option<Box<Predicate>>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let can_run = predicate.as_ref().is_none_or(|p| p());
        let (status, _) = watch::channel(CommandStatus {
            running: false,
            can_run,
        });

        Self {
            inner: Arc::new(Inner {
                name,
                operation: Box::new(move || -> BoxFuture<'static, anyhow::Result<()>> {
                    Box::pin(operation())
                }),
                predicate,
                running: AtomicBool::new(false),
                status,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn can_run(&self) -> bool {
        !self.is_running() && self.inner.eligible()
    }

    /// Watch the running flag and eligibility. Receivers can be awaited from
    /// any task or thread, independently of where the command runs.
    pub fn subscribe(&self) -> watch::Receiver<CommandStatus> {
        self.inner.status.subscribe()
    }

    /// Re-evaluate eligibility, e.g. after state the predicate reads has changed.
    pub fn refresh_can_run(&self) {
        self.inner.publish(self.is_running());
    }

    /// Fire-and-forget entry point for UI triggers. Must be called from within
    /// a Tokio runtime.
    pub fn execute(&self) {
        let command = self.clone();
        tokio::spawn(async move { command.run().await });
    }

    /// Run the operation unless the command is busy or ineligible.
    pub async fn run(&self) {
        if !self.inner.eligible() {
            tracing::debug!(command = self.inner.name, "command not eligible, ignoring trigger");
            return;
        }

        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(command = self.inner.name, "command already running, ignoring trigger");
            return;
        }

        let _guard = RunningGuard { inner: &self.inner };
        self.inner.publish(true);

        if let Err(err) = (self.inner.operation)().await {
            tracing::error!(command = self.inner.name, error = ?err, "command failed");
        }
    }
}

impl Inner {
    fn eligible(&self) -> bool {
        self.predicate.as_ref().is_none_or(|p| p())
    }

    fn publish(&self, running: bool) {
        let status = CommandStatus {
            running,
            can_run: !running && self.eligible(),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Resets the running flag when the invocation ends, including on panic or
/// when the future is dropped mid-flight.
struct RunningGuard<'a> {
    inner: &'a Inner,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.publish(false);
    }
}

impl fmt::Debug for AsyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCommand")
            .field("name", &self.inner.name)
            .field("running", &self.is_running())
            .finish()
    }
}
