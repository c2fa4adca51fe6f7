//! Checkout handles and the capability shared by both pool variants

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::errors::PoolResult;

pub(crate) type ReturnFn<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A pooled object that automatically returns to the pool when dropped
pub struct PooledObject<T> {
    value: Option<T>,
    return_fn: ReturnFn<T>,
}

impl<T> PooledObject<T> {
    pub(crate) fn new(value: T, return_fn: ReturnFn<T>) -> Self {
        Self {
            value: Some(value),
            return_fn,
        }
    }

    /// Take the inner value without returning it to the pool.
    ///
    /// The caller may later hand it back with
    /// [`Pool::return_object`].
    pub fn into_inner(mut self) -> T {
        self.value.take().expect("Value already taken")
    }
}

impl<T> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            (self.return_fn)(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledObject").field(&self.value).finish()
    }
}

/// Operations common to [`UnboundedPool`](crate::UnboundedPool) and
/// [`BoundedPool`](crate::BoundedPool).
///
/// None of these calls ever wait for another thread.
pub trait Pool<T> {
    /// Check out an object that goes back to the pool when dropped
    fn get_object(&self) -> PoolResult<PooledObject<T>>;

    /// Check out an object by value
    fn take_object(&self) -> PoolResult<T>;

    /// Hand an object back
    fn return_object(&self, item: T);

    /// Approximate number of objects waiting in the pool
    fn pool_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn collecting() -> (ReturnFn<u32>, Arc<Mutex<Vec<u32>>>) {
        let returned = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&returned);
        let return_fn: ReturnFn<u32> = Arc::new(move |v: u32| sink.lock().push(v));
        (return_fn, returned)
    }

    #[test]
    fn test_returns_on_drop() {
        let (return_fn, returned) = collecting();

        {
            let mut obj = PooledObject::new(7, return_fn);
            *obj += 1;
            assert_eq!(*obj, 8);
        }

        assert_eq!(*returned.lock(), vec![8]);
    }

    #[test]
    fn test_into_inner_skips_return() {
        let (return_fn, returned) = collecting();

        let obj = PooledObject::new(3, return_fn);
        assert_eq!(obj.into_inner(), 3);

        assert!(returned.lock().is_empty());
    }
}
