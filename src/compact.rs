//! Compactor: drains finished paths into the accumulator and shrinks the
//! active set to the paths that keep bouncing.

use crate::film::Accumulator;
use crate::path::PathPool;
use rayon::prelude::*;

/// Adds the throughput of every terminated active path to the accumulator,
/// then partitions the active set so only live paths remain.
/// Returns the new active count. Survivors are not kept in order.
pub fn compact(pool: &mut PathPool, accumulator: &Accumulator) -> usize {
    pool.active_paths()
        .par_iter()
        .filter(|path| path.is_terminated())
        .for_each(|path| accumulator.add(path.pixel_index, &path.throughput));
    let alive = itertools::partition(pool.active_paths_mut(), |path| !path.is_terminated());
    pool.set_active_count(alive);
    alive
}

/// Adds every still-active path regardless of its bounce counter and empties
/// the active set. Used when the depth limit ends the bounce loop.
pub fn flush(pool: &mut PathPool, accumulator: &Accumulator) -> usize {
    let flushed = pool.active_count();
    pool.active_paths()
        .par_iter()
        .for_each(|path| accumulator.add(path.pixel_index, &path.throughput));
    pool.set_active_count(0);
    flushed
}
