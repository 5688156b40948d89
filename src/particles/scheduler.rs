//! Splits one simulation step across workers.
//!
//! The particle range `[0, n)` is cut into `w` contiguous ranges; every range
//! is evaluated by one task on a persistent rayon pool and the step does not
//! return until all of them have finished. Workers read a shared source
//! buffer and each writes only its own chunk of the target buffer, handed out
//! as disjoint `&mut` slices, so no locking is involved.
use std::ops::Range;

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::particles::{integrate, Boundary, ForceEvaluator, Particle};
use crate::utils::PhysicsError;

/// Partitions `[0, n)` into `w` contiguous ranges of `n / w` particles each,
/// with the remainder folded into the last range.
///
/// When `w > n` the leading ranges are empty and the last one holds everything.
///
/// # Panics
///
/// Panics if `w` is zero.
///
/// # Examples
///
/// ```
/// use rs_nbody::particles::partition;
///
/// assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
/// assert_eq!(partition(4, 1), vec![0..4]);
/// ```
pub fn partition(n: usize, w: usize) -> Vec<Range<usize>> {
    assert!(w > 0, "cannot partition across zero workers");
    let per_worker = n / w;
    (0..w)
        .map(|t| {
            let start = t * per_worker;
            let end = if t == w - 1 { n } else { (t + 1) * per_worker };
            start..end
        })
        .collect()
}

/// Runs the multi-worker step over a fixed set of workers.
pub struct Scheduler {
    workers: usize,
    pool: ThreadPool,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("workers", &self.workers)
            .finish()
    }
}

impl Scheduler {
    /// Starts a pool of `workers` threads that lives as long as the scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` is zero or the threads cannot be spawned.
    pub fn new(workers: usize) -> Result<Self, PhysicsError> {
        if workers == 0 {
            return Err(PhysicsError::InvalidWorkerCount(workers));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("nbody-worker-{}", i))
            .build()
            .map_err(|e| PhysicsError::ThreadPool(e.to_string()))?;
        debug!("started worker pool with {} threads", workers);
        Ok(Scheduler { workers, pool })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluates and integrates every particle of `source` into `target`.
    ///
    /// Each worker copies its particles from `source`, applies the full-sweep
    /// force from `evaluator` and integrates them. `source` is never written.
    /// Returns once every worker has finished.
    ///
    /// # Panics
    ///
    /// Panics if the buffers differ in length.
    pub fn run<E: ForceEvaluator>(
        &self,
        evaluator: &E,
        source: &[Particle],
        target: &mut [Particle],
        dt: f64,
        boundary: Option<&Boundary>,
    ) {
        assert_eq!(source.len(), target.len(), "source and target buffers differ in length");

        self.pool.scope(|scope| {
            let mut rest = target;
            for range in partition(source.len(), self.workers) {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                if chunk.is_empty() {
                    continue;
                }
                scope.spawn(move |_| {
                    for (slot, i) in chunk.iter_mut().zip(range) {
                        *slot = source[i];
                        let force = evaluator.force_on(i, source);
                        integrate(slot, force, dt, boundary);
                    }
                });
            }
        });
    }
}
