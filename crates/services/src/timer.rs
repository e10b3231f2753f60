use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A unit of work that runs once after a delay unless cancelled first.
///
/// Dropping the handle cancels the task, so a holder that goes away never
/// leaves a timer behind.
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Schedule `task` to run after `delay` on the current Tokio runtime.
    #[must_use]
    pub fn spawn<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    pub fn cancel(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_task(counter: &Arc<AtomicUsize>, delay: Duration) -> DelayedTask {
        let counter = Arc::clone(counter);
        DelayedTask::spawn(delay, async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = counter_task(&counter, Duration::from_millis(1500));

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_prevent_firing() {
        let counter = Arc::new(AtomicUsize::new(0));
        counter_task(&counter, Duration::from_secs(1)).cancel();
        {
            let _dropped = counter_task(&counter, Duration::from_secs(1));
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
