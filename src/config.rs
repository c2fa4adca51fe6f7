//! Pool configuration options

use std::fmt;
use std::sync::Arc;

use crate::errors::{PoolError, PoolResult};
use crate::generator::Generator;
use crate::scheduler::{AdjustmentScheduler, SchedulerName};

/// Default lower bound for a bounded pool
pub const DEFAULT_MINIMUM_POOL_SIZE: usize = 5;

/// Default upper bound for a bounded pool
pub const DEFAULT_MAXIMUM_POOL_SIZE: usize = 25;

const MINIMUM_KEY: &str = "MINIMUM_POOL_SIZE";
const MAXIMUM_KEY: &str = "MAXIMUM_POOL_SIZE";
const INITIAL_KEY: &str = "INITIAL_SIZE";

/// Configuration for object pool behavior
///
/// # Examples
///
/// ```
/// use esox_boundedpool::{Generator, PoolConfiguration};
///
/// let config = PoolConfiguration::new()
///     .with_generator(Generator::new(|| Vec::<u8>::with_capacity(4096)))
///     .with_minimum_pool_size(2)
///     .with_maximum_pool_size(8);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.minimum_pool_size, 2);
/// assert_eq!(config.maximum_pool_size, 8);
/// ```
pub struct PoolConfiguration<T> {
    /// Factory for new objects
    pub generator: Option<Generator<T>>,

    /// Lower bound kept by the adjustment pass (bounded pools)
    pub minimum_pool_size: usize,

    /// Upper bound kept by the adjustment pass (bounded pools)
    pub maximum_pool_size: usize,

    /// Objects created up front (unbounded pools)
    pub initial_size: usize,

    /// Where background adjustment passes run. `None` picks
    /// [`default_scheduler`](crate::default_scheduler), an
    /// [`AutoScheduler`](crate::AutoScheduler), at construction. A
    /// [`TokioScheduler`](crate::TokioScheduler) stops adjusting once its
    /// runtime shuts down.
    pub scheduler: Option<Arc<dyn AdjustmentScheduler>>,
}

impl<T> Default for PoolConfiguration<T> {
    fn default() -> Self {
        Self {
            generator: None,
            minimum_pool_size: DEFAULT_MINIMUM_POOL_SIZE,
            maximum_pool_size: DEFAULT_MAXIMUM_POOL_SIZE,
            initial_size: 0,
            scheduler: None,
        }
    }
}

impl<T> Clone for PoolConfiguration<T> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            minimum_pool_size: self.minimum_pool_size,
            maximum_pool_size: self.maximum_pool_size,
            initial_size: self.initial_size,
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T> fmt::Debug for PoolConfiguration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("generator", &self.generator)
            .field("minimum_pool_size", &self.minimum_pool_size)
            .field("maximum_pool_size", &self.maximum_pool_size)
            .field("initial_size", &self.initial_size)
            .field("scheduler", &self.scheduler.as_ref().map(SchedulerName))
            .finish()
    }
}

impl<T> PoolConfiguration<T> {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read sizes from environment variables named `{prefix}MINIMUM_POOL_SIZE`,
    /// `{prefix}MAXIMUM_POOL_SIZE` and `{prefix}INITIAL_SIZE`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env(prefix: &str) -> PoolResult<Self> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Read sizes through an arbitrary key lookup.
    ///
    /// Values are parsed as signed integers so that a negative size is
    /// reported as such instead of as unparsable text.
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_boundedpool::{PoolConfiguration, PoolError};
    ///
    /// let config = PoolConfiguration::<String>::from_lookup("POOL_", |key| match key {
    ///     "POOL_MINIMUM_POOL_SIZE" => Some("-1".to_string()),
    ///     _ => None,
    /// });
    ///
    /// assert!(matches!(config, Err(PoolError::NegativeMinimumPoolSize(-1))));
    /// ```
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> PoolResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(minimum) = read_signed(prefix, MINIMUM_KEY, &lookup)? {
            config.minimum_pool_size =
                usize::try_from(minimum).map_err(|_| PoolError::NegativeMinimumPoolSize(minimum))?;
        }

        if let Some(maximum) = read_signed(prefix, MAXIMUM_KEY, &lookup)? {
            if maximum < 1 {
                return Err(PoolError::MaximumPoolSizeTooSmall(maximum));
            }
            config.maximum_pool_size =
                usize::try_from(maximum).map_err(|_| PoolError::MaximumPoolSizeTooSmall(maximum))?;
        }

        if let Some(initial) = read_signed(prefix, INITIAL_KEY, &lookup)? {
            config.initial_size =
                usize::try_from(initial).map_err(|_| PoolError::NegativeInitialSize(initial))?;
        }

        config.validate_bounds()?;
        Ok(config)
    }

    /// Set the object generator
    pub fn with_generator(mut self, generator: Generator<T>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the minimum pool size
    pub fn with_minimum_pool_size(mut self, size: usize) -> Self {
        self.minimum_pool_size = size;
        self
    }

    /// Set the maximum pool size
    pub fn with_maximum_pool_size(mut self, size: usize) -> Self {
        self.maximum_pool_size = size;
        self
    }

    /// Set the number of objects an unbounded pool creates up front
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Set where background adjustment passes run
    pub fn with_scheduler(mut self, scheduler: Arc<dyn AdjustmentScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Check that a generator is present and the bounds are consistent
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_boundedpool::{Generator, PoolConfiguration, PoolError};
    ///
    /// let config = PoolConfiguration::new()
    ///     .with_generator(Generator::new(String::new))
    ///     .with_minimum_pool_size(10)
    ///     .with_maximum_pool_size(5);
    ///
    /// assert!(matches!(
    ///     config.validate(),
    ///     Err(PoolError::MinimumExceedsMaximum { minimum: 10, maximum: 5 })
    /// ));
    /// ```
    pub fn validate(&self) -> PoolResult<()> {
        if self.generator.is_none() {
            return Err(PoolError::MissingGenerator);
        }
        self.validate_bounds()
    }

    fn validate_bounds(&self) -> PoolResult<()> {
        if self.maximum_pool_size < 1 {
            return Err(PoolError::MaximumPoolSizeTooSmall(0));
        }
        if self.minimum_pool_size > self.maximum_pool_size {
            return Err(PoolError::MinimumExceedsMaximum {
                minimum: self.minimum_pool_size,
                maximum: self.maximum_pool_size,
            });
        }
        Ok(())
    }

    pub(crate) fn take_generator(&mut self) -> PoolResult<Generator<T>> {
        self.generator.take().ok_or(PoolError::MissingGenerator)
    }
}

fn read_signed<F>(prefix: &str, key: &str, lookup: &F) -> PoolResult<Option<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    let name = format!("{}{}", prefix, key);
    match lookup(&name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| PoolError::InvalidSetting { key: name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::<String>::new();
        assert_eq!(config.minimum_pool_size, 5);
        assert_eq!(config.maximum_pool_size, 25);
        assert_eq!(config.initial_size, 0);
        assert!(config.scheduler.is_none());
    }

    #[test]
    fn test_missing_generator() {
        let config = PoolConfiguration::<String>::new();
        assert!(matches!(config.validate(), Err(PoolError::MissingGenerator)));
    }

    #[test]
    fn test_zero_maximum_rejected() {
        let config = PoolConfiguration::new()
            .with_generator(Generator::new(String::new))
            .with_minimum_pool_size(0)
            .with_maximum_pool_size(0);
        assert!(matches!(config.validate(), Err(PoolError::MaximumPoolSizeTooSmall(0))));
    }

    #[test]
    fn test_lookup_reads_prefixed_keys() {
        let config = PoolConfiguration::<String>::from_lookup(
            "DB_",
            lookup_from(&[
                ("DB_MINIMUM_POOL_SIZE", "0"),
                ("DB_MAXIMUM_POOL_SIZE", " 3 "),
                ("DB_INITIAL_SIZE", "7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.minimum_pool_size, 0);
        assert_eq!(config.maximum_pool_size, 3);
        assert_eq!(config.initial_size, 7);
    }

    #[test]
    fn test_lookup_rejects_bad_values() {
        let negative_max = PoolConfiguration::<String>::from_lookup(
            "",
            lookup_from(&[("MAXIMUM_POOL_SIZE", "-4")]),
        );
        assert!(matches!(negative_max, Err(PoolError::MaximumPoolSizeTooSmall(-4))));

        let negative_initial = PoolConfiguration::<String>::from_lookup(
            "",
            lookup_from(&[("INITIAL_SIZE", "-2")]),
        );
        assert!(matches!(negative_initial, Err(PoolError::NegativeInitialSize(-2))));

        let inverted = PoolConfiguration::<String>::from_lookup(
            "",
            lookup_from(&[("MINIMUM_POOL_SIZE", "10"), ("MAXIMUM_POOL_SIZE", "5")]),
        );
        assert!(matches!(
            inverted,
            Err(PoolError::MinimumExceedsMaximum { minimum: 10, maximum: 5 })
        ));

        match PoolConfiguration::<String>::from_lookup("", lookup_from(&[("MINIMUM_POOL_SIZE", "many")])) {
            Err(PoolError::InvalidSetting { key, value }) => {
                assert_eq!(key, "MINIMUM_POOL_SIZE");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
