//! Pool that keeps its population between a minimum and a maximum

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{Ordering, fence};

use crossbeam::queue::SegQueue;
use parking_lot::Mutex;

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::gate::AdjustmentGate;
use crate::generator::Generator;
use crate::item::PoolItem;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::pool::{Pool, PooledObject, ReturnFn};
use crate::scheduler::{default_scheduler, AdjustmentScheduler};

/// Result of a single adjustment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentOutcome {
    /// This caller held the gate and brought the pool within bounds
    Completed,

    /// Another pass held the gate; it will pick up any drift
    Skipped,
}

struct BoundedInner<T: PoolItem> {
    available: SegQueue<T>,
    generator: Generator<T>,
    minimum_pool_size: usize,
    maximum_pool_size: usize,
    gate: AdjustmentGate,
    scheduler: Arc<dyn AdjustmentScheduler>,
    metrics: MetricsTracker,
    last_adjustment_error: Mutex<Option<PoolError>>,
}

impl<T: PoolItem> BoundedInner<T> {
    fn within_bounds(&self) -> bool {
        let count = self.available.len();
        count >= self.minimum_pool_size && count <= self.maximum_pool_size
    }

    fn generate(&self) -> PoolResult<T> {
        match self.generator.generate() {
            Ok(item) => {
                MetricsTracker::record(&self.metrics.total_generated);
                Ok(item)
            }
            Err(e) => {
                MetricsTracker::record(&self.metrics.generator_failures);
                Err(e)
            }
        }
    }

    fn pop_or_generate(&self) -> PoolResult<T> {
        let item = match self.available.pop() {
            Some(item) => item,
            None => self.generate()?,
        };
        MetricsTracker::record(&self.metrics.total_retrieved);
        Ok(item)
    }

    fn accept_return(&self, mut item: T) {
        if self.available.len() < self.maximum_pool_size {
            item.reset_state();
            self.available.push(item);
            MetricsTracker::record(&self.metrics.total_returned);
        } else {
            tracing::debug!(
                maximum_pool_size = self.maximum_pool_size,
                "Pool at capacity, releasing returned object"
            );
            item.release_resources();
            MetricsTracker::record(&self.metrics.total_released);
        }
    }

    /// One grow-then-shrink pass. The caller must hold the gate.
    ///
    /// The two loops read the count independently; concurrent callers can
    /// push it past either bound again before the pass ends.
    fn run_pass(&self) -> PoolResult<()> {
        let mut grown = 0usize;
        let mut shrunk = 0usize;

        while self.available.len() < self.minimum_pool_size {
            let item = self.generate()?;
            self.available.push(item);
            grown += 1;
        }

        while self.available.len() > self.maximum_pool_size {
            match self.available.pop() {
                Some(item) => {
                    item.release_resources();
                    MetricsTracker::record(&self.metrics.total_released);
                    shrunk += 1;
                }
                None => break,
            }
        }

        MetricsTracker::record(&self.metrics.adjustment_passes);
        tracing::trace!(
            grown,
            shrunk,
            pool_count = self.available.len(),
            "Completed pool adjustment pass"
        );
        Ok(())
    }

    /// Run passes until the pool is observed within bounds after the gate
    /// has been released, or until another caller holds the gate.
    fn try_adjust(&self) -> PoolResult<AdjustmentOutcome> {
        loop {
            let Some(guard) = self.gate.try_acquire() else {
                MetricsTracker::record(&self.metrics.adjustments_skipped);
                return Ok(AdjustmentOutcome::Skipped);
            };

            let result = self.run_pass();
            drop(guard);
            fence(Ordering::SeqCst);
            result?;

            // Callers that lost the CAS while we held the gate rely on this check.
            if self.within_bounds() {
                return Ok(AdjustmentOutcome::Completed);
            }
        }
    }

    fn adjust_in_background(&self) {
        if let Err(e) = self.try_adjust() {
            tracing::warn!(error = %e, "Background pool adjustment failed");
            *self.last_adjustment_error.lock() = Some(e);
        }
    }

    /// Called after every checkout and return. Dispatches nothing when the
    /// pool is within bounds (the next mutation checks again) or when a pass
    /// holds the gate (its post-release check covers this mutation).
    fn schedule_adjustment(self: &Arc<Self>) {
        fence(Ordering::SeqCst);
        if self.within_bounds() || self.gate.is_held() {
            MetricsTracker::record(&self.metrics.adjustments_skipped);
            return;
        }

        let inner = Arc::clone(self);
        self.scheduler
            .schedule(Box::new(move || inner.adjust_in_background()));
    }
}

impl<T: PoolItem> Drop for BoundedInner<T> {
    fn drop(&mut self) {
        while let Some(item) = self.available.pop() {
            item.release_resources();
        }
    }
}

/// Thread-safe pool that keeps between `minimum_pool_size` and
/// `maximum_pool_size` objects queued.
///
/// Checkout and return never wait. When either leaves the pool outside its
/// bounds, an adjustment attempt is dispatched to the configured scheduler;
/// at most one pass runs at a time and the pool converges to its bounds once
/// traffic stops.
///
/// # Examples
///
/// ```
/// use esox_boundedpool::{BoundedPool, Generator, InlineScheduler, PoolConfiguration};
/// use std::sync::Arc;
///
/// let config = PoolConfiguration::new()
///     .with_generator(Generator::new(|| Vec::<u8>::with_capacity(512)))
///     .with_minimum_pool_size(2)
///     .with_maximum_pool_size(4)
///     .with_scheduler(Arc::new(InlineScheduler));
///
/// let pool = BoundedPool::from_config(config).unwrap();
/// assert_eq!(pool.pool_count(), 2);
///
/// {
///     let mut buffer = pool.get_object().unwrap();
///     buffer.extend_from_slice(b"request");
/// }
///
/// // The returned buffer was cleared before it went back in.
/// assert!(pool.take_object().unwrap().is_empty());
/// ```
pub struct BoundedPool<T: PoolItem> {
    inner: Arc<BoundedInner<T>>,
    return_fn: ReturnFn<T>,
}

impl<T: PoolItem> BoundedPool<T> {
    /// Create a pool with the default bounds of 5 and 25
    pub fn new(generator: Generator<T>) -> PoolResult<Self> {
        Self::from_config(PoolConfiguration::new().with_generator(generator))
    }

    /// Create a pool with explicit bounds
    pub fn with_bounds(
        generator: Generator<T>,
        minimum_pool_size: usize,
        maximum_pool_size: usize,
    ) -> PoolResult<Self> {
        Self::from_config(
            PoolConfiguration::new()
                .with_generator(generator)
                .with_minimum_pool_size(minimum_pool_size)
                .with_maximum_pool_size(maximum_pool_size),
        )
    }

    /// Create a pool from a configuration.
    ///
    /// Runs one adjustment pass on the calling thread, so the pool starts
    /// with at least `minimum_pool_size` objects. A generator failure during
    /// that pass fails construction.
    pub fn from_config(mut config: PoolConfiguration<T>) -> PoolResult<Self> {
        config.validate()?;
        let generator = config.take_generator()?;
        let scheduler = config.scheduler.take().unwrap_or_else(default_scheduler);

        let inner = Arc::new(BoundedInner {
            available: SegQueue::new(),
            generator,
            minimum_pool_size: config.minimum_pool_size,
            maximum_pool_size: config.maximum_pool_size,
            gate: AdjustmentGate::new(),
            scheduler,
            metrics: MetricsTracker::new(),
            last_adjustment_error: Mutex::new(None),
        });

        inner.try_adjust()?;

        tracing::debug!(
            minimum_pool_size = inner.minimum_pool_size,
            maximum_pool_size = inner.maximum_pool_size,
            pool_count = inner.available.len(),
            "Created bounded object pool"
        );

        let return_target = Arc::clone(&inner);
        let return_fn: ReturnFn<T> = Arc::new(move |item: T| {
            return_target.accept_return(item);
            return_target.schedule_adjustment();
        });

        Ok(Self { inner, return_fn })
    }

    /// Get an object, creating one if the pool is empty
    pub fn get_object(&self) -> PoolResult<PooledObject<T>> {
        let item = self.take_object()?;
        Ok(PooledObject::new(item, Arc::clone(&self.return_fn)))
    }

    /// Get an object by value, creating one if the pool is empty
    pub fn take_object(&self) -> PoolResult<T> {
        let item = self.inner.pop_or_generate()?;
        self.inner.schedule_adjustment();
        Ok(item)
    }

    /// Put an object back.
    ///
    /// Below the maximum the object is reset and queued; at the maximum it
    /// is released and dropped.
    pub fn return_object(&self, item: T) {
        (self.return_fn)(item);
    }

    /// Run an adjustment attempt on the calling thread
    pub fn adjust(&self) -> PoolResult<AdjustmentOutcome> {
        self.inner.try_adjust()
    }

    /// Whether an adjustment pass currently holds the gate
    pub fn is_adjusting(&self) -> bool {
        self.inner.gate.is_held()
    }

    /// The most recent error raised by a background adjustment pass
    pub fn last_adjustment_error(&self) -> Option<PoolError> {
        self.inner.last_adjustment_error.lock().clone()
    }

    /// Number of queued objects; may be stale under concurrent use
    pub fn pool_count(&self) -> usize {
        self.inner.available.len()
    }

    pub fn minimum_pool_size(&self) -> usize {
        self.inner.minimum_pool_size
    }

    pub fn maximum_pool_size(&self) -> usize {
        self.inner.maximum_pool_size
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner.metrics.get_metrics(
            self.pool_count(),
            Some((self.inner.minimum_pool_size, self.inner.maximum_pool_size)),
        )
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }
}

impl<T: PoolItem> Clone for BoundedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            return_fn: Arc::clone(&self.return_fn),
        }
    }
}

impl<T: PoolItem> Pool<T> for BoundedPool<T> {
    fn get_object(&self) -> PoolResult<PooledObject<T>> {
        BoundedPool::get_object(self)
    }

    fn take_object(&self) -> PoolResult<T> {
        BoundedPool::take_object(self)
    }

    fn return_object(&self, item: T) {
        BoundedPool::return_object(self, item)
    }

    fn pool_count(&self) -> usize {
        BoundedPool::pool_count(self)
    }
}
