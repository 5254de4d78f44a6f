use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A single pending-call slot with cancel-and-replace semantics.
///
/// Scheduling a new call aborts whatever was pending, so a burst of calls
/// collapses into the last one. This replaces ad hoc timer-id juggling
/// wherever the app wants "run this, but only after the input settles".
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run after `delay`, cancelling any pending call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn call<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut slot) = self.pending.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Drop the pending call, if any, without running it.
    pub fn cancel(&self) {
        let Ok(mut slot) = self.pending.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Whether a call is still scheduled or running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn burst_of_calls_runs_only_the_last() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicU32::new(0));
        let last = Arc::new(AtomicU32::new(0));

        for i in 1..=3_u32 {
            let runs = Arc::clone(&runs);
            let last = Arc::clone(&last);
            debouncer.call(Duration::from_millis(200), async move {
                runs.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_pending_call() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicU32::new(0));

        {
            let runs = Arc::clone(&runs);
            debouncer.call(Duration::from_millis(100), async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(debouncer.is_pending());
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_run() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let runs = Arc::clone(&runs);
            debouncer.call(Duration::from_millis(50), async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
