//! Lifecycle capability for pooled objects

use std::collections::VecDeque;

/// An object that a [`BoundedPool`](crate::BoundedPool) can recycle.
///
/// Both hooks may run on a background adjustment thread, not only on the
/// thread that checked the item out.
///
/// # Examples
///
/// ```
/// use esox_boundedpool::PoolItem;
///
/// struct Buffer {
///     bytes: Vec<u8>,
/// }
///
/// impl PoolItem for Buffer {
///     fn reset_state(&mut self) {
///         self.bytes.clear();
///     }
/// }
///
/// let mut buffer = Buffer { bytes: vec![1, 2, 3] };
/// buffer.reset_state();
/// assert!(buffer.bytes.is_empty());
/// ```
pub trait PoolItem: Send + 'static {
    /// Restore the item to a reusable state. Must be idempotent.
    fn reset_state(&mut self);

    /// Permanently dispose of the item. The pool never sees it again.
    fn release_resources(self)
    where
        Self: Sized,
    {
    }
}

impl<T: Send + 'static> PoolItem for Vec<T> {
    fn reset_state(&mut self) {
        self.clear();
    }
}

impl<T: Send + 'static> PoolItem for VecDeque<T> {
    fn reset_state(&mut self) {
        self.clear();
    }
}

impl PoolItem for String {
    fn reset_state(&mut self) {
        self.clear();
    }
}
