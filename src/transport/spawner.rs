//! Task spawning capability handed to connections.

use futures_util::future::BoxFuture;
use tokio::runtime::Handle;

use super::ConfigurationError;

/// Spawns detached tasks onto the process scheduler.
///
/// Connections never call `tokio::spawn` directly; whoever builds them decides where
/// dispatched work runs.
pub trait Spawner: Send + Sync + 'static {
    /// Schedule `task` to run independently. The caller does not wait for it.
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawner backed by a tokio runtime handle.
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Wrap an explicit runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Capture the runtime running on the current thread.
    pub fn current() -> Result<Self, ConfigurationError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| ConfigurationError::NoRuntime)
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn current_outside_runtime_fails() {
        assert!(matches!(TokioSpawner::current(), Err(ConfigurationError::NoRuntime)));
    }

    #[tokio::test]
    async fn spawned_task_runs() {
        let spawner = TokioSpawner::current().unwrap();
        let (tx, rx) = oneshot::channel();
        spawner.spawn(Box::pin(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }
}
