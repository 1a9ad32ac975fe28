//! Resettable timer task.
//!
//! Each `schedule` call replaces the pending task, so the work only runs
//! once the caller has been quiet for the whole delay. Must be used from
//! within a tokio runtime.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay, replacing whatever was pending
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        if let Some(previous) = self.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending task. Returns true if one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            handle.abort();
        }
    }
}
