//! Bounded worker pool shared by every batch fetch
//!
//! A single semaphore caps in-flight upstream requests across all batches that
//! share the pool, so running the character and corporation lookups side by
//! side still never exceeds the ceiling. An optional `governor` quota adds a
//! per-second request budget on top.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

use futures::future::join_all;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::sync::Semaphore;

/// Default ceiling on simultaneous upstream requests
pub const DEFAULT_CONCURRENCY: usize = 25;

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    ceiling: usize,
}

impl WorkerPool {
    /// Create a pool with the given ceiling (at least one)
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(ceiling)),
            limiter: None,
            ceiling,
        }
    }

    /// Additionally limit task starts to `per_second`
    pub fn with_rate_limit(mut self, per_second: NonZeroU32) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::direct(Quota::per_second(per_second))));
        self
    }

    #[inline]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Run one task once a slot is free
    pub async fn run<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        // The semaphore is never closed, so acquire cannot fail
        let _permit = self.semaphore.acquire().await.ok();
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        task().await
    }

    /// Run `task` for every item, at most `ceiling` at a time, preserving input order
    pub async fn map<I, K, F, Fut, T>(&self, items: I, task: F) -> Vec<(K, T)>
    where
        I: IntoIterator<Item = K>,
        K: Copy,
        F: Fn(K) -> Fut,
        Fut: Future<Output = T>,
    {
        let task = &task;
        join_all(
            items
                .into_iter()
                .map(|item| async move { (item, self.run(|| task(item)).await) }),
        )
        .await
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("ceiling", &self.ceiling)
            .field("available", &self.semaphore.available_permits())
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}
