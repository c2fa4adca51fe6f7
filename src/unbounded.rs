//! Pool that grows on demand without an upper limit

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::queue::SegQueue;

use crate::config::PoolConfiguration;
use crate::errors::PoolResult;
use crate::generator::Generator;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::pool::{Pool, PooledObject, ReturnFn};

struct UnboundedInner<T> {
    available: SegQueue<T>,
    generator: Generator<T>,
    metrics: MetricsTracker,
}

impl<T> UnboundedInner<T> {
    fn pop_or_generate(&self) -> PoolResult<T> {
        let item = match self.available.pop() {
            Some(item) => item,
            None => match self.generator.generate() {
                Ok(item) => {
                    MetricsTracker::record(&self.metrics.total_generated);
                    item
                }
                Err(e) => {
                    MetricsTracker::record(&self.metrics.generator_failures);
                    return Err(e);
                }
            },
        };
        MetricsTracker::record(&self.metrics.total_retrieved);
        Ok(item)
    }

    fn push(&self, item: T) {
        self.available.push(item);
        MetricsTracker::record(&self.metrics.total_returned);
    }
}

/// Thread-safe pool with lazy growth and no capacity limit.
///
/// Returned objects are queued as they are; no reset is applied.
///
/// # Examples
///
/// ```
/// use esox_boundedpool::{Generator, UnboundedPool};
///
/// let pool = UnboundedPool::with_initial_size(Generator::new(|| vec![0u8; 16]), 3).unwrap();
/// assert_eq!(pool.pool_count(), 3);
///
/// {
///     let buffer = pool.get_object().unwrap();
///     assert_eq!(buffer.len(), 16);
///     assert_eq!(pool.pool_count(), 2);
/// }
///
/// assert_eq!(pool.pool_count(), 3);
/// ```
pub struct UnboundedPool<T: Send + 'static> {
    inner: Arc<UnboundedInner<T>>,
    return_fn: ReturnFn<T>,
}

impl<T: Send + 'static> UnboundedPool<T> {
    /// Create an empty pool
    pub fn new(generator: Generator<T>) -> Self {
        let inner = Arc::new(UnboundedInner {
            available: SegQueue::new(),
            generator,
            metrics: MetricsTracker::new(),
        });

        let return_target = Arc::clone(&inner);
        let return_fn: ReturnFn<T> = Arc::new(move |item: T| return_target.push(item));

        Self { inner, return_fn }
    }

    /// Create a pool holding `initial_size` freshly generated objects
    pub fn with_initial_size(generator: Generator<T>, initial_size: usize) -> PoolResult<Self> {
        let pool = Self::new(generator);
        for _ in 0..initial_size {
            let item = pool.inner.generator.generate()?;
            MetricsTracker::record(&pool.inner.metrics.total_generated);
            pool.inner.available.push(item);
        }

        tracing::debug!(initial_size, "Created unbounded object pool");
        Ok(pool)
    }

    /// Create a pool from a configuration. Only the generator and the
    /// initial size apply to an unbounded pool.
    pub fn from_config(mut config: PoolConfiguration<T>) -> PoolResult<Self> {
        let generator = config.take_generator()?;
        Self::with_initial_size(generator, config.initial_size)
    }

    /// Get an object, creating one if the pool is empty
    pub fn get_object(&self) -> PoolResult<PooledObject<T>> {
        let item = self.inner.pop_or_generate()?;
        Ok(PooledObject::new(item, Arc::clone(&self.return_fn)))
    }

    /// Get an object by value, creating one if the pool is empty
    pub fn take_object(&self) -> PoolResult<T> {
        self.inner.pop_or_generate()
    }

    /// Put an object back. It is available to the next caller immediately.
    pub fn return_object(&self, item: T) {
        self.inner.push(item);
    }

    /// Number of queued objects; may be stale under concurrent use
    pub fn pool_count(&self) -> usize {
        self.inner.available.len()
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner.metrics.get_metrics(self.pool_count(), None)
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

impl<T: Send + 'static> Clone for UnboundedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            return_fn: Arc::clone(&self.return_fn),
        }
    }
}

impl<T: Send + 'static> Pool<T> for UnboundedPool<T> {
    fn get_object(&self) -> PoolResult<PooledObject<T>> {
        UnboundedPool::get_object(self)
    }

    fn take_object(&self) -> PoolResult<T> {
        UnboundedPool::take_object(self)
    }

    fn return_object(&self, item: T) {
        UnboundedPool::return_object(self, item)
    }

    fn pool_count(&self) -> usize {
        UnboundedPool::pool_count(self)
    }
}
