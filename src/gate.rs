//! Non-blocking re-entrancy gate for adjustment passes

use std::sync::atomic::{AtomicBool, Ordering};

/// Single flag that admits at most one adjustment pass at a time.
///
/// Acquisition is a compare-and-swap; a caller that loses simply gives up.
/// All accesses are `SeqCst`: a releasing holder re-reads the queue length
/// after its store, while a dispatching caller reads the flag after its queue
/// mutation, and at least one of the two must see the other's write.
#[derive(Debug, Default)]
pub(crate) struct AdjustmentGate {
    held: AtomicBool,
}

impl AdjustmentGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the gate without waiting
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GateGuard { gate: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// Releases the gate when dropped, including during unwinding.
#[must_use = "the gate is released as soon as the guard is dropped"]
pub(crate) struct GateGuard<'a> {
    gate: &'a AdjustmentGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.held.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_second_acquire_loses() {
        let gate = AdjustmentGate::new();

        let guard = gate.try_acquire();
        assert!(guard.is_some());
        assert!(gate.is_held());
        assert!(gate.try_acquire().is_none());

        drop(guard);
        assert!(!gate.is_held());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_release_is_seen_by_other_threads() {
        let gate = Arc::new(AdjustmentGate::new());
        let rounds = 10_000;
        let holder_gate = Arc::clone(&gate);

        let holder = thread::spawn(move || {
            let mut acquired = 0;
            while acquired < rounds {
                if let Some(guard) = holder_gate.try_acquire() {
                    acquired += 1;
                    drop(guard);
                }
            }
        });

        let mut acquired = 0;
        while acquired < rounds {
            if let Some(guard) = gate.try_acquire() {
                assert!(gate.is_held());
                acquired += 1;
                drop(guard);
            }
        }

        holder.join().unwrap();
        assert!(!gate.is_held());
    }

    #[test]
    fn test_released_on_panic() {
        let gate = AdjustmentGate::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = gate.try_acquire();
            panic!("generator blew up");
        }));

        assert!(result.is_err());
        assert!(!gate.is_held());
    }
}
