// EsoxSolutions.BoundedPool
// Thread-safe, self-bounding object pool
// Version 1.0.0

// This is just a binary wrapper - the actual library is in lib.rs
// Set RUST_LOG=esox_boundedpool=trace to watch adjustment passes.

use std::thread;

use esox_boundedpool::{
    AdjustmentOutcome, BoundedPool, Generator, PoolConfiguration, PoolResult, UnboundedPool,
};
use tracing_subscriber::EnvFilter;

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== EsoxSolutions.BoundedPool v1.0.0 ===");
    println!();

    unbounded_demo()?;
    bounded_demo()?;
    Ok(())
}

fn unbounded_demo() -> PoolResult<()> {
    println!("Unbounded pool:");
    let pool = UnboundedPool::with_initial_size(Generator::new(|| String::with_capacity(64)), 2)?;

    {
        let mut text = pool.get_object()?;
        text.push_str("hello");
        println!("  Got object: {:?}, queued: {}", *text, pool.pool_count());
    }

    println!("  Queued after return: {}", pool.pool_count());
    println!();
    Ok(())
}

fn bounded_demo() -> PoolResult<()> {
    println!("Bounded pool:");
    let config = PoolConfiguration::<Vec<u8>>::from_env("OBJECTPOOL_")?
        .with_generator(Generator::new(|| Vec::with_capacity(1024)));
    let pool = BoundedPool::from_config(config)?;
    println!(
        "  Bounds: [{}, {}], queued after construction: {}",
        pool.minimum_pool_size(),
        pool.maximum_pool_size(),
        pool.pool_count()
    );

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let pool = pool.clone();
            thread::spawn(move || -> PoolResult<()> {
                for round in 0..250 {
                    let mut buffer = pool.get_object()?;
                    buffer.extend_from_slice(&[worker as u8, round as u8]);
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => eprintln!("  Worker panicked"),
        }
    }

    while pool.adjust()? != AdjustmentOutcome::Completed {
        thread::yield_now();
    }

    println!("  Queued after quiescing: {}", pool.pool_count());
    let metrics = pool.export_metrics();
    let mut keys: Vec<_> = metrics.keys().collect();
    keys.sort();
    println!("  Metrics:");
    for key in keys {
        println!("    {}: {}", key, metrics[key]);
    }

    Ok(())
}
