//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use esox_boundedpool::{Generator, UnboundedPool};
///
/// let pool = UnboundedPool::with_initial_size(Generator::new(|| 0u64), 2).unwrap();
///
/// {
///     let _obj = pool.get_object().unwrap();
///     let metrics = pool.get_metrics();
///     assert_eq!(metrics.total_retrieved, 1);
///     assert_eq!(metrics.available_objects, 1);
/// }
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Total objects handed out, whether reused or freshly generated
    pub total_retrieved: usize,

    /// Total objects produced by the generator
    pub total_generated: usize,

    /// Total objects accepted back into the pool
    pub total_returned: usize,

    /// Total objects discarded with `release_resources`
    pub total_released: usize,

    /// Adjustment passes that ran to completion
    pub adjustment_passes: usize,

    /// Adjustment attempts skipped because the pool was within bounds or a
    /// pass already held the gate
    pub adjustments_skipped: usize,

    /// Generator calls that failed
    pub generator_failures: usize,

    /// Objects currently queued
    pub available_objects: usize,

    /// Lower bound, for bounded pools
    pub minimum_pool_size: Option<usize>,

    /// Upper bound, for bounded pools
    pub maximum_pool_size: Option<usize>,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_retrieved".to_string(), self.total_retrieved.to_string());
        metrics.insert("total_generated".to_string(), self.total_generated.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("adjustment_passes".to_string(), self.adjustment_passes.to_string());
        metrics.insert("adjustments_skipped".to_string(), self.adjustments_skipped.to_string());
        metrics.insert("generator_failures".to_string(), self.generator_failures.to_string());
        metrics.insert("available_objects".to_string(), self.available_objects.to_string());
        if let Some(min) = self.minimum_pool_size {
            metrics.insert("minimum_pool_size".to_string(), min.to_string());
        }
        if let Some(max) = self.maximum_pool_size {
            metrics.insert("maximum_pool_size".to_string(), max.to_string());
        }
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_boundedpool::{BoundedPool, Generator, InlineScheduler, PoolConfiguration};
    /// use std::collections::HashMap;
    /// use std::sync::Arc;
    ///
    /// let config = PoolConfiguration::new()
    ///     .with_generator(Generator::new(String::new))
    ///     .with_scheduler(Arc::new(InlineScheduler));
    /// let pool = BoundedPool::from_config(config).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("my_pool", Some(&tags));
    /// assert!(output.contains("objectpool_objects_available"));
    /// assert!(output.contains("objectpool_pool_size_max"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        Self::write_metric(&mut output, "objectpool_objects_available", "gauge", "Current available objects", &labels, metrics.available_objects);
        if let Some(min) = metrics.minimum_pool_size {
            Self::write_metric(&mut output, "objectpool_pool_size_min", "gauge", "Configured minimum pool size", &labels, min);
        }
        if let Some(max) = metrics.maximum_pool_size {
            Self::write_metric(&mut output, "objectpool_pool_size_max", "gauge", "Configured maximum pool size", &labels, max);
        }

        // Counter metrics
        Self::write_metric(&mut output, "objectpool_objects_retrieved_total", "counter", "Total objects retrieved", &labels, metrics.total_retrieved);
        Self::write_metric(&mut output, "objectpool_objects_generated_total", "counter", "Total objects generated", &labels, metrics.total_generated);
        Self::write_metric(&mut output, "objectpool_objects_returned_total", "counter", "Total objects returned", &labels, metrics.total_returned);
        Self::write_metric(&mut output, "objectpool_objects_released_total", "counter", "Total objects released", &labels, metrics.total_released);
        Self::write_metric(&mut output, "objectpool_adjustment_passes_total", "counter", "Completed adjustment passes", &labels, metrics.adjustment_passes);
        Self::write_metric(&mut output, "objectpool_adjustments_skipped_total", "counter", "Adjustment attempts skipped while within bounds or while a pass ran", &labels, metrics.adjustments_skipped);
        Self::write_metric(&mut output, "objectpool_generator_failures_total", "counter", "Generator failures", &labels, metrics.generator_failures);

        output
    }

    fn write_metric(output: &mut String, name: &str, kind: &str, help: &str, labels: &str, value: usize) {
        let _ = writeln!(output, "# HELP {} {}", name, help);
        let _ = writeln!(output, "# TYPE {} {}", name, kind);
        let _ = writeln!(output, "{}{{{}}} {}", name, labels, value);
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut sorted: Vec<_> = tags.iter().collect();
            sorted.sort();
            for (key, value) in sorted {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub total_retrieved: AtomicUsize,
    pub total_generated: AtomicUsize,
    pub total_returned: AtomicUsize,
    pub total_released: AtomicUsize,
    pub adjustment_passes: AtomicUsize,
    pub adjustments_skipped: AtomicUsize,
    pub generator_failures: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, available: usize, bounds: Option<(usize, usize)>) -> PoolMetrics {
        PoolMetrics {
            total_retrieved: self.total_retrieved.load(Ordering::Relaxed),
            total_generated: self.total_generated.load(Ordering::Relaxed),
            total_returned: self.total_returned.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            adjustment_passes: self.adjustment_passes.load(Ordering::Relaxed),
            adjustments_skipped: self.adjustments_skipped.load(Ordering::Relaxed),
            generator_failures: self.generator_failures.load(Ordering::Relaxed),
            available_objects: available,
            minimum_pool_size: bounds.map(|(min, _)| min),
            maximum_pool_size: bounds.map(|(_, max)| max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_includes_bounds_only_when_known() {
        let tracker = MetricsTracker::new();
        MetricsTracker::record(&tracker.total_generated);
        MetricsTracker::record(&tracker.total_generated);

        let unbounded = tracker.get_metrics(2, None).export();
        assert_eq!(unbounded["total_generated"], "2");
        assert!(!unbounded.contains_key("maximum_pool_size"));

        let bounded = tracker.get_metrics(2, Some((1, 4))).export();
        assert_eq!(bounded["minimum_pool_size"], "1");
        assert_eq!(bounded["maximum_pool_size"], "4");
    }

    #[test]
    fn test_prometheus_labels_are_sorted() {
        let metrics = PoolMetrics::default();
        let mut tags = HashMap::new();
        tags.insert("zone".to_string(), "b".to_string());
        tags.insert("app".to_string(), "a".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "conns", Some(&tags));
        assert!(output.contains("objectpool_objects_available{pool=\"conns\",app=\"a\",zone=\"b\"} 0"));
        assert!(output.contains("# TYPE objectpool_objects_released_total counter"));
        assert!(!output.contains("objectpool_pool_size_min"));
    }
}
