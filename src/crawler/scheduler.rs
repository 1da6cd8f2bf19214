//! Concurrency limiting for chain resolution
//!
//! A single semaphore bounds how many redirect chains are resolved at once.
//! Permits are owned so they can move into spawned tasks and are released
//! when the task finishes, whether it succeeded, failed or panicked.

use crate::CrawlerError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of in-flight resolutions
#[derive(Debug, Clone)]
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl Scheduler {
    /// Creates a scheduler allowing `concurrency` resolutions at once
    ///
    /// A limit of 0 is raised to 1 so the batch can always make progress.
    pub fn new(concurrency: usize) -> Self {
        let limit = concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Waits for a free slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, CrawlerError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CrawlerError::Task(format!("scheduler closed: {}", e)))
    }

    /// Configured concurrency limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
