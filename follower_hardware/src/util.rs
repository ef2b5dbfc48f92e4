use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait until `level` reports the expected state, or a timeout expires.
/// Sleeps in small intervals to avoid CPU spinning. Used for the
/// ultrasonic echo edges, which arrive hundreds of microseconds apart.
pub fn wait_for_level_with_timeout(
    mut at_level: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Instant> {
    let deadline = Instant::now() + timeout;
    while !at_level() {
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(Instant::now())
}
