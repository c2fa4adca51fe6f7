//! Factories that produce new pool objects on demand

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::errors::{PoolError, PoolResult};

type Factory<T> = dyn Fn() -> PoolResult<T> + Send + Sync;

/// Thread-safe factory invoked whenever a pool needs a fresh object.
///
/// Generators are called concurrently from checkout paths and from background
/// adjustment passes.
///
/// # Examples
///
/// ```
/// use esox_boundedpool::Generator;
///
/// let generator = Generator::new(|| Vec::<u8>::with_capacity(1024));
/// let buffer = generator.generate().unwrap();
/// assert_eq!(buffer.capacity(), 1024);
/// ```
pub struct Generator<T> {
    factory: Arc<Factory<T>>,
}

impl<T> Generator<T> {
    /// Create a generator from an infallible factory
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: 'static,
    {
        Self {
            factory: Arc::new(move || Ok(factory())),
        }
    }

    /// Create a generator from a factory that can fail
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_boundedpool::{Generator, PoolError};
    ///
    /// let generator = Generator::<String>::fallible(|| {
    ///     Err(std::io::Error::other("connection refused"))
    /// });
    ///
    /// assert!(matches!(generator.generate(), Err(PoolError::Generator(_))));
    /// ```
    pub fn fallible<F, E>(factory: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        T: 'static,
    {
        Self {
            factory: Arc::new(move || factory().map_err(|e| PoolError::Generator(Arc::new(e)))),
        }
    }

    /// Produce a new object
    pub fn generate(&self) -> PoolResult<T> {
        (self.factory)()
    }
}

impl<T> Clone for Generator<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_clones_share_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let generator = Generator::new(move || counter.fetch_add(1, Ordering::Relaxed));
        let clone = generator.clone();

        assert_eq!(generator.generate().unwrap(), 0);
        assert_eq!(clone.generate().unwrap(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_fallible_maps_error() {
        let generator =
            Generator::<u32>::fallible(|| "x".parse::<u32>());

        match generator.generate() {
            Err(PoolError::Generator(source)) => {
                assert!(source.to_string().contains("invalid digit"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
