// Periodic background tasks on the tokio runtime

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// A task run on a fixed interval
pub trait ScheduledTask: Send + Sync + 'static {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>>;

    /// Stop scheduling once this returns true
    fn should_terminate(&self) -> bool {
        false
    }
}

impl<T: ScheduledTask> ScheduledTask for Arc<T> {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        (**self).run()
    }

    fn should_terminate(&self) -> bool {
        (**self).should_terminate()
    }
}

/// Runs a [`ScheduledTask`] every `interval` until shut down.
///
/// The first run happens one interval after start. A failing run is logged
/// and does not stop the schedule.
pub struct ScheduledExecutor {
    interval: Duration,
    task_name: String,
    shutdown: Arc<AtomicBool>,
}

impl ScheduledExecutor {
    pub fn new(task_name: impl Into<String>, interval: Duration) -> Self {
        Self { task_name: task_name.into(), interval, shutdown: Arc::new(AtomicBool::new(false)) }
    }

    /// Flag that stops the executor before its next run when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub async fn start<T>(self, task: T)
    where
        T: ScheduledTask,
    {
        tracing::info!(
            "Starting scheduled task '{}' with interval: {:?}",
            self.task_name,
            self.interval
        );

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if self.shutdown.load(Ordering::Relaxed) || task.should_terminate() {
                break;
            }

            match task.run().await {
                Ok(()) => tracing::debug!("Scheduled task '{}' completed", self.task_name),
                Err(e) => tracing::error!("Scheduled task '{}' failed: {}", self.task_name, e),
            }
        }

        tracing::info!("Scheduled task '{}' stopped", self.task_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingTask {
        counter: Arc<AtomicU32>,
        max_runs: u32,
    }

    impl ScheduledTask for CountingTask {
        fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
            Box::pin(async move {
                let count = self.counter.fetch_add(1, Ordering::Relaxed);
                if count == 0 {
                    anyhow::bail!("first run fails");
                }
                Ok(())
            })
        }

        fn should_terminate(&self) -> bool {
            self.counter.load(Ordering::Relaxed) >= self.max_runs
        }
    }

    #[tokio::test]
    async fn test_runs_until_terminated_despite_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = CountingTask { counter: counter.clone(), max_runs: 3 };

        ScheduledExecutor::new("test", Duration::from_millis(20)).start(task).await;

        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_shutdown_handle_stops_executor() {
        let counter = Arc::new(AtomicU32::new(0));
        let task = CountingTask { counter: counter.clone(), max_runs: u32::MAX };

        let executor = ScheduledExecutor::new("stoppable", Duration::from_millis(20));
        executor.shutdown_handle().store(true, Ordering::Relaxed);
        executor.start(task).await;

        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }
}
