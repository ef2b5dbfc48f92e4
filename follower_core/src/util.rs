//! Tick-period helpers.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Period in microseconds for a tick rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Period in milliseconds for a tick rate in Hz, clamped like `period_us`.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_for_common_rates() {
        assert_eq!(period_us(20), 50_000);
        assert_eq!(period_ms(20), 50);
        assert_eq!(period_ms(50), 20);
    }

    #[test]
    fn zero_hz_is_clamped() {
        assert_eq!(period_us(0), MICROS_PER_SEC);
        assert_eq!(period_ms(0), MILLIS_PER_SEC);
    }
}
