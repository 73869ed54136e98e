//! Prefetch Scheduler
//!
//! A de-duplicating FIFO queue of resources drained by a bounded pool of
//! workers. Each worker holds at most one in-flight load, so at most
//! `max_concurrent` loads overlap.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::optimizer::Resource;

// == Prefetch Loader ==
/// Performs one speculative load. Retries and bookkeeping belong to the
/// implementation; an `Err` here is only logged by the scheduler.
#[async_trait]
pub trait PrefetchLoader: Send + Sync {
    async fn load(&self, resource: &Resource) -> Result<()>;
}

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<Resource>,
    in_flight: HashSet<String>,
}

#[derive(Debug)]
struct SchedulerInner {
    state: Mutex<QueueState>,
    notify: Notify,
    max_concurrent: usize,
}

// == Prefetch Scheduler ==
/// Cheap to clone; clones share the same queue.
#[derive(Debug, Clone)]
pub struct PrefetchScheduler {
    inner: Arc<SchedulerInner>,
}

impl PrefetchScheduler {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(QueueState::default()),
                notify: Notify::new(),
                max_concurrent: max_concurrent.max(1),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // Critical sections never panic midway, so a poisoned lock still holds consistent state
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // == Enqueue ==
    /// Queues a resource unless one with the same id is already queued or in
    /// flight. Returns whether it was queued.
    pub fn enqueue(&self, resource: Resource) -> bool {
        {
            let mut state = self.state();
            if state.in_flight.contains(&resource.id)
                || state.queue.iter().any(|queued| queued.id == resource.id)
            {
                debug!("Prefetch for '{}' already pending, skipping", resource.id);
                return false;
            }
            debug!("Queued prefetch for '{}'", resource.id);
            state.queue.push_back(resource);
        }

        self.inner.notify.notify_one();
        true
    }

    /// Pops the next resource and marks it in flight, if a slot is free.
    fn try_start(&self) -> Option<Resource> {
        let mut state = self.state();
        if state.in_flight.len() >= self.inner.max_concurrent {
            return None;
        }
        let resource = state.queue.pop_front()?;
        state.in_flight.insert(resource.id.clone());
        Some(resource)
    }

    fn finish(&self, id: &str) {
        self.state().in_flight.remove(id);
        // A slot opened up; wake a parked worker in case work is waiting
        self.inner.notify.notify_one();
    }

    async fn run_one<L>(&self, loader: &L, resource: Resource)
    where
        L: PrefetchLoader + ?Sized,
    {
        match loader.load(&resource).await {
            Ok(()) => debug!("Prefetched '{}'", resource.id),
            Err(err) => warn!("Error prefetching resource '{}': {}", resource.id, err),
        }
        self.finish(&resource.id);
    }

    // == Drain ==
    /// Loads everything currently queued and returns once the queue is empty
    /// and the loads it started have completed.
    pub async fn drain<L>(&self, loader: &L)
    where
        L: PrefetchLoader + ?Sized,
    {
        let workers = (0..self.inner.max_concurrent).map(|_| async move {
            while let Some(resource) = self.try_start() {
                self.run_one(loader, resource).await;
            }
        });
        futures::future::join_all(workers).await;
    }

    // == Spawn Workers ==
    /// Starts `max_concurrent` long-lived workers that park while the queue is
    /// empty. Abort the returned handles to stop them; in-flight loads are not
    /// cancelled gracefully.
    pub fn spawn_workers<L>(&self, loader: Arc<L>) -> Vec<JoinHandle<()>>
    where
        L: PrefetchLoader + 'static,
    {
        info!("Starting {} prefetch workers", self.inner.max_concurrent);

        (0..self.inner.max_concurrent)
            .map(|_| {
                let scheduler = self.clone();
                let loader = Arc::clone(&loader);
                tokio::spawn(async move {
                    loop {
                        match scheduler.try_start() {
                            Some(resource) => scheduler.run_one(loader.as_ref(), resource).await,
                            None => scheduler.inner.notify.notified().await,
                        }
                    }
                })
            })
            .collect()
    }

    // == Inspection ==
    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.state().in_flight.len()
    }

    pub fn is_pending_or_in_flight(&self, id: &str) -> bool {
        let state = self.state();
        state.in_flight.contains(id) || state.queue.iter().any(|queued| queued.id == id)
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// Drops everything still queued. Loads already in flight run to completion.
    pub fn clear(&self) {
        self.state().queue.clear();
    }
}
