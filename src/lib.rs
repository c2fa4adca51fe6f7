//! # EsoxSolutions.BoundedPool
//!
//! Thread-safe, self-bounding object pool for Rust. Hands out reusable
//! objects to concurrent callers, takes them back, and keeps the pooled
//! population between a minimum and a maximum without ever blocking a caller.
//!
//! ## Features
//!
//! - Lock-free checkout and return backed by a `crossbeam` segmented queue
//! - Unbounded pools that grow on demand
//! - Bounded pools that refill and trim themselves in the background
//! - Compare-and-swap gate so at most one adjustment pass runs at a time
//! - Pluggable scheduling of adjustment passes (threads, tokio, inline)
//! - Automatic return of objects via RAII (Drop trait)
//! - Reset and release lifecycle hooks through [`PoolItem`]
//! - Metrics with Prometheus text export
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_boundedpool::{BoundedPool, Generator};
//!
//! let pool = BoundedPool::with_bounds(Generator::new(|| Vec::<u8>::with_capacity(256)), 2, 8).unwrap();
//! {
//!     let mut buffer = pool.get_object().unwrap();
//!     buffer.extend_from_slice(b"hello");
//!     // Buffer is cleared and returned when `buffer` goes out of scope
//! }
//! assert!(pool.pool_count() >= 2);
//! ```

mod bounded;
mod config;
mod errors;
mod gate;
mod generator;
mod item;
mod metrics;
mod pool;
mod scheduler;
mod unbounded;

pub use bounded::{AdjustmentOutcome, BoundedPool};
pub use config::{DEFAULT_MAXIMUM_POOL_SIZE, DEFAULT_MINIMUM_POOL_SIZE, PoolConfiguration};
pub use errors::{PoolError, PoolResult};
pub use generator::Generator;
pub use item::PoolItem;
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::{Pool, PooledObject};
pub use scheduler::{
    AdjustmentScheduler, AdjustmentTask, AutoScheduler, InlineScheduler, ThreadScheduler,
    TokioScheduler, default_scheduler,
};
pub use unbounded::UnboundedPool;
