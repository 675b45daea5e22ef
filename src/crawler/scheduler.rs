//! Bounded worker pool for fan-out/fan-in phases
//!
//! This module handles:
//! - Global concurrency limiting via a counting semaphore
//! - Spawning one task per work unit and joining them all before merging
//! - Keeping each result at its input index so completion order never leaks
//! - Counting completed units for advisory progress reporting

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shared, monotonically increasing count of completed work units
#[derive(Debug, Clone, Default)]
pub struct Progress {
    completed: Arc<AtomicU64>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units completed so far
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub(crate) fn tick(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runs work units concurrently under a fixed concurrency cap
///
/// Every phase that uses the same pool shares one semaphore, so the cap
/// holds across the whole crawl.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    /// Global semaphore for limiting in-flight units
    semaphore: Arc<Semaphore>,

    capacity: usize,

    progress: Progress,
}

impl WorkerPool {
    /// Creates a pool allowing `max_concurrent` units in flight
    ///
    /// A cap of zero is raised to one.
    pub fn new(max_concurrent: usize, progress: Progress) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            progress,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of units that may start right now
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Applies `work` to every item and waits for all of them
    ///
    /// # Returns
    ///
    /// One slot per input item, in input order. A slot is `None` when its
    /// unit produced nothing or its task panicked; other units are unaffected.
    pub async fn run_all<I, T, F, Fut>(&self, items: Vec<I>, work: F) -> Vec<Option<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let mut results: Vec<Option<T>> = Vec::with_capacity(items.len());
        results.resize_with(items.len(), || None);

        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&self.semaphore);
            let progress = self.progress.clone();
            let unit = work(item);

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let output = unit.await;
                progress.tick();
                (index, output)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, output)) => results[index] = output,
                Err(e) => tracing::warn!("Worker task failed: {}", e),
            }
        }

        results
    }
}
