// demos/benchmark.rs
//
// Times `advance` over a sweep of particle and worker counts.
// Run with `RUST_LOG=info cargo run --release --example benchmark`.

use std::time::Instant;

use rs_nbody::particles::ParticleStore;
use rs_nbody::utils::PhysicsError;

const UPDATES: usize = 100;

fn main() -> Result<(), PhysicsError> {
    env_logger::init();

    for count in [100, 1000, 10000] {
        for workers in [1, 2, 4, 8] {
            // The largest system is only worth timing on the widest pool.
            if count == 10000 && workers != 8 {
                continue;
            }

            let mut store = ParticleStore::create(count, workers, None)?;
            let start = Instant::now();
            store.simulate(UPDATES);
            let elapsed = start.elapsed();

            println!(
                "{} particles, {} workers: {} updates in {:.3?} ({:.3?} per update)",
                count,
                workers,
                UPDATES,
                elapsed,
                elapsed / UPDATES as u32
            );
        }
    }

    Ok(())
}
