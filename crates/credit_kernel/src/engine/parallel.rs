//! Rayon scheduling for the simulation engine.
//!
//! Rows of the output buffer are processed in fixed-size chunks. Each chunk
//! owns a disjoint `&mut` slice of the buffer together with the matching
//! slice of row ids, so workers never contend on shared state.

use credit_core::ConfigurationError;
use rayon::prelude::*;

/// Rows per parallel chunk.
///
/// Small enough to balance uneven rows, large enough to amortise task
/// scheduling.
pub const DEFAULT_CHUNK_ROWS: usize = 64;

/// Fills `buffer` row by row in parallel.
///
/// `buffer` holds `row_ids.len()` rows of `width` values. `fill_row` receives
/// the row id and its output slice.
pub(crate) fn fill_rows<F>(
    buffer: &mut [f64],
    row_ids: &[usize],
    width: usize,
    chunk_rows: usize,
    fill_row: F,
) where
    F: Fn(usize, &mut [f64]) + Sync + Send,
{
    if width == 0 || row_ids.is_empty() {
        return;
    }
    let chunk_rows = chunk_rows.max(1);
    buffer
        .par_chunks_mut(chunk_rows * width)
        .zip(row_ids.par_chunks(chunk_rows))
        .for_each(|(out, ids)| {
            for (row, &id) in out.chunks_exact_mut(width).zip(ids) {
                fill_row(id, row);
            }
        });
}

/// Runs `op` on a dedicated pool of `threads` workers, or on the global pool
/// when `threads` is `None`.
///
/// # Errors
///
/// `ConfigurationError::ThreadPool` if the pool cannot be built.
pub(crate) fn run_in_pool<R, OP>(threads: Option<usize>, op: OP) -> Result<R, ConfigurationError>
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    match threads {
        None => Ok(op()),
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("credit-mc-worker-{}", i))
                .build()
                .map_err(|e| ConfigurationError::ThreadPool(e.to_string()))?;
            Ok(pool.install(op))
        }
    }
}

/// Worker count `op` would run with.
pub(crate) fn effective_threads(threads: Option<usize>) -> usize {
    threads.unwrap_or_else(rayon::current_num_threads)
}
