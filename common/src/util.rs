use std::time::Instant;

/// Runs `f`, returning its result and the elapsed wall time in whole
/// microseconds.
pub fn time_micros<T>(f: impl FnOnce() -> T) -> (T, u64) {
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed().as_micros() as u64;
    (value, elapsed)
}
