use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use super::listeners::{Callback, ListenerSet, Subscription};
use super::{BatcherConfig, BatcherStats, FlushMode, FlushReport};
use crate::{CountStore, Error};

/// Coalesces view events and commits them to a [`CountStore`] in batches.
///
/// Cloning is cheap; clones share the same pending map, listeners and timer.
#[derive(Clone)]
pub struct ViewCountBatcher {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CountStore>,
    config: BatcherConfig,
    pending: Mutex<HashMap<String, u64>>,
    /// Deltas taken by the running flush and not yet settled.
    in_flight: Mutex<HashMap<String, u64>>,
    flush_in_progress: AtomicBool,
    listeners: Arc<ListenerSet>,
    timer: Mutex<Option<JoinHandle<()>>>,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    flush_cycles: AtomicU64,
    committed: AtomicU64,
    requeued: AtomicU64,
}

/// Ends a flush cycle: unsettled deltas go back to the pending map and the
/// in-progress flag is cleared, including when the cycle unwinds or its task
/// is dropped.
struct CycleGuard(Arc<Inner>);

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let leftovers = std::mem::take(&mut *self.0.in_flight());
        if !leftovers.is_empty() {
            tracing::warn!(ids = leftovers.len(), "flush ended early, restoring unsettled view counts");
            let mut pending = self.0.pending();
            for (entity_id, delta) in leftovers {
                let slot = pending.entry(entity_id).or_insert(0);
                *slot = slot.saturating_add(delta);
            }
        }
        self.0.flush_in_progress.store(false, Ordering::Release);
    }
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, entity_id: &str) {
        self.in_flight().remove(entity_id);
    }

    /// Add `delta` back on top of whatever arrived since the snapshot.
    fn requeue(&self, entity_id: &str, delta: u64) {
        self.settle(entity_id);
        let mut pending = self.pending();
        let slot = pending.entry(entity_id.to_string()).or_insert(0);
        *slot = slot.saturating_add(delta);
        self.counters.requeued.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.timer().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ViewCountBatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCountBatcher")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ViewCountBatcher {
    pub fn new(store: Arc<dyn CountStore>, config: BatcherConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                pending: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                flush_in_progress: AtomicBool::new(false),
                listeners: Arc::new(ListenerSet::default()),
                timer: Mutex::new(None),
                counters: Counters::default(),
            }),
        }
    }

    /// Flush every `interval`, replacing any timer started earlier.
    ///
    /// The first flush happens one interval from now. Each tick runs the
    /// flush as its own task, so a slow remote never delays the timer; ticks
    /// that land while a flush is still running are skipped by the flush
    /// guard. Must be called from within a tokio runtime.
    pub fn start_batching(&self, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.counters.ticks.fetch_add(1, Ordering::Relaxed);

                let batcher = ViewCountBatcher { inner };
                tokio::spawn(async move {
                    batcher.flush_updates().await;
                });
            }
        });

        if let Some(previous) = self.inner.timer().replace(handle) {
            previous.abort();
        }

        tracing::info!(interval_ms = interval.as_millis() as u64, "view count batcher started");
    }

    /// Cancel the timer. A flush that already started keeps running.
    pub fn stop_batching(&self) {
        if let Some(handle) = self.inner.timer().take() {
            handle.abort();
            tracing::info!("view count batcher stopped");
        }
    }

    pub fn is_batching(&self) -> bool {
        self.inner.timer().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Record one view for `entity_id`.
    ///
    /// Never blocks on the network. When called inside a tokio runtime it
    /// also computes the optimistic count in the background and hands it to
    /// the listeners; that notification is best effort and may arrive after
    /// notifications for later views.
    pub fn increment_view_count(&self, entity_id: &str) {
        self.record_views(entity_id, 1);
    }

    /// Record `views` views for `entity_id` at once, with a single
    /// optimistic notification.
    pub fn record_views(&self, entity_id: &str, views: u64) {
        if entity_id.is_empty() {
            tracing::warn!("ignoring view for empty entity id");
            return;
        }
        if views == 0 {
            return;
        }

        let pending = {
            let mut pending = self.inner.pending();
            let slot = pending.entry(entity_id.to_string()).or_insert(0);
            *slot = slot.saturating_add(views);
            *slot
        };
        tracing::debug!(entity_id, views, pending, "views recorded");

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let batcher = self.clone();
            let entity_id = entity_id.to_string();
            runtime.spawn(async move {
                let count = batcher.get_optimistic_count(&entity_id).await;
                batcher.inner.listeners.notify(&entity_id, count);
            });
        }
    }

    /// Register `callback` for `(entity_id, count)` updates.
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str, u64) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        self.inner.listeners.add(callback)
    }

    /// Remote count plus views not yet flushed.
    ///
    /// If the remote read fails the remote count is treated as zero.
    pub async fn get_optimistic_count(&self, entity_id: &str) -> u64 {
        let pending = self.pending_count(entity_id);

        match self.inner.store.read_count(entity_id).await {
            Ok(remote) => remote.saturating_add(pending),
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "failed to read current view count");
                pending
            }
        }
    }

    /// Views recorded for `entity_id` that are not part of a running flush.
    pub fn pending_count(&self, entity_id: &str) -> u64 {
        self.inner.pending().get(entity_id).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> BatcherStats {
        let (pending_ids, pending_views) = {
            let pending = self.inner.pending();
            (pending.len(), pending.values().sum())
        };
        let in_flight_views = self.inner.in_flight().values().sum();
        let counters = &self.inner.counters;

        BatcherStats {
            pending_ids,
            pending_views,
            in_flight_views,
            ticks: counters.ticks.load(Ordering::Relaxed),
            flush_cycles: counters.flush_cycles.load(Ordering::Relaxed),
            committed: counters.committed.load(Ordering::Relaxed),
            requeued: counters.requeued.load(Ordering::Relaxed),
            listeners: self.inner.listeners.len(),
        }
    }

    /// Commit all pending deltas.
    ///
    /// Returns `None` without touching the store when another flush is
    /// running or nothing is pending. Views recorded while this runs belong
    /// to the next cycle. Per-id failures put the delta back and do not stop
    /// the rest of the cycle; there is no backoff, so a permanently failing
    /// id is retried on every cycle.
    ///
    /// The cycle runs on its own task: dropping the returned future stops
    /// waiting for the report but not the flush.
    pub async fn flush_updates(&self) -> Option<FlushReport> {
        let (guard, updates) = self.begin_cycle()?;

        let batcher = self.clone();
        let cycle = tokio::spawn(async move {
            let report = batcher.run_cycle(updates).await;
            drop(guard);
            report
        });

        match cycle.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "view count flush task failed");
                None
            }
        }
    }

    /// Claim the in-progress flag and move the pending map into `in_flight`.
    fn begin_cycle(&self) -> Option<(CycleGuard, Vec<(String, u64)>)> {
        let inner = &self.inner;

        if inner
            .flush_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("flush already in progress, skipping");
            return None;
        }
        let guard = CycleGuard(Arc::clone(inner));

        let updates = std::mem::take(&mut *inner.pending());
        if updates.is_empty() {
            return None;
        }
        let snapshot: Vec<(String, u64)> = updates.iter().map(|(id, delta)| (id.clone(), *delta)).collect();
        *inner.in_flight() = updates;

        Some((guard, snapshot))
    }

    async fn run_cycle(&self, updates: Vec<(String, u64)>) -> FlushReport {
        let inner = &self.inner;
        let started = Instant::now();
        let total_views: u64 = updates.iter().map(|(_, delta)| delta).sum();
        tracing::info!(ids = updates.len(), views = total_views, "flushing batched view counts");

        let batch_size = inner.config.batch_size.max(1);
        let mut report = FlushReport::default();

        for (index, batch) in updates.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(inner.config.batch_delay).await;
            }
            self.flush_batch(batch, &mut report).await;
            report.batches += 1;
        }

        inner.counters.flush_cycles.fetch_add(1, Ordering::Relaxed);
        inner
            .counters
            .committed
            .fetch_add(report.committed as u64, Ordering::Relaxed);

        tracing::info!(
            committed = report.committed,
            views = report.views_committed,
            requeued = report.requeued,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "view count flush finished"
        );

        report
    }

    async fn flush_batch(&self, batch: &[(String, u64)], report: &mut FlushReport) {
        let inner = &self.inner;
        let mut outstanding: HashMap<String, u64> = batch.iter().cloned().collect();
        let mut join_set = JoinSet::new();

        for (entity_id, delta) in batch.iter().cloned() {
            let store = Arc::clone(&inner.store);
            let mode = inner.config.mode;
            join_set.spawn(async move {
                let result = commit(store.as_ref(), mode, &entity_id, delta).await;
                (entity_id, delta, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let (entity_id, delta, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(error = %e, "view count commit task failed");
                    continue;
                }
            };
            outstanding.remove(&entity_id);

            match result {
                Ok(new_count) => {
                    inner.settle(&entity_id);
                    tracing::debug!(entity_id, delta, new_count, "view count committed");
                    report.committed += 1;
                    report.views_committed += delta;
                    inner.listeners.notify(&entity_id, new_count);
                }
                Err(e) => {
                    tracing::warn!(entity_id, delta, error = %e, "view count commit failed, requeued");
                    inner.requeue(&entity_id, delta);
                    report.requeued += 1;
                }
            }
        }

        // Tasks that died without reporting still owe their delta.
        for (entity_id, delta) in outstanding {
            inner.requeue(&entity_id, delta);
            report.requeued += 1;
        }
    }

    /// Stop the timer, wait for a running flush, then flush what is left.
    pub async fn shutdown(&self) -> Option<FlushReport> {
        self.stop_batching();
        while self.inner.flush_in_progress.load(Ordering::Acquire) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.flush_updates().await
    }
}

async fn commit(store: &dyn CountStore, mode: FlushMode, entity_id: &str, delta: u64) -> Result<u64, Error> {
    match mode {
        FlushMode::ReadModifyWrite => {
            let current = store.read_count(entity_id).await?;
            let new_count = current.saturating_add(delta);
            store.write_count(entity_id, new_count).await?;
            Ok(new_count)
        }
        FlushMode::AtomicIncrement => store.increment_count(entity_id, delta).await,
    }
}
