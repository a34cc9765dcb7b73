//! Wall-clock timing of pipeline steps.
//!
//! Observational only: the wrapped closure runs exactly once and its result
//! is returned untouched.

use std::time::{Duration, Instant};

use tracing::info;

/// Runs `f`, logs its elapsed wall-clock time under `label` and returns the
/// result together with the elapsed time.
///
/// # Examples
///
/// ```rust
/// use credit_risk::timing::timed;
///
/// let (sum, elapsed) = timed("sum", || (1..=10).sum::<u32>());
/// assert_eq!(sum, 55);
/// assert!(elapsed.as_secs() < 60);
/// ```
pub fn timed<T, F>(label: &str, f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    info!(step = label, elapsed_ms = elapsed.as_secs_f64() * 1e3, "step finished");
    (value, elapsed)
}
