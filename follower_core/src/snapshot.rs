//! Frozen per-tick sensor readings.

use follower_traits::RawFrame;

/// Declared bit range of the IR reflectance sensors (10-bit ADC).
pub const IR_MAX: u16 = 1023;
/// Physical range of the proximity sensor in centimeters.
pub const PROXIMITY_MIN_CM: f32 = 2.0;
pub const PROXIMITY_MAX_CM: f32 = 400.0;

/// Immutable reading of all seven sensors, created once per control tick.
///
/// Values outside the declared physical ranges are carried through
/// unmodified; the safety arbiter turns them into `Stop { SensorFault }`
/// rather than this type rejecting them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    /// IR channels far-left..far-right; index 2 is the center sensor.
    pub ir: [u16; 5],
    /// Contact sensor; true = collision.
    pub bump: bool,
    /// Ranging distance in cm, valid within [2, 400].
    pub proximity_cm: f32,
    /// Monotonic tick counter from the caller's loop. Used only for
    /// recovery timing, never for ordering.
    pub tick: u64,
}

impl SensorSnapshot {
    pub fn new(ir: [u16; 5], bump: bool, proximity_cm: f32, tick: u64) -> Self {
        Self {
            ir,
            bump,
            proximity_cm,
            tick,
        }
    }

    /// Build a snapshot from a driver frame, stamping the tick.
    pub fn from_frame(frame: RawFrame, tick: u64) -> Self {
        Self {
            ir: frame.ir,
            bump: frame.bump,
            proximity_cm: frame.proximity_cm,
            tick,
        }
    }

    /// True when any reading is outside its declared physical range.
    pub fn has_sensor_fault(&self) -> bool {
        if !self.proximity_cm.is_finite()
            || !(PROXIMITY_MIN_CM..=PROXIMITY_MAX_CM).contains(&self.proximity_cm)
        {
            return true;
        }
        self.ir.iter().any(|&v| v > IR_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_snapshot_is_not_faulted() {
        let s = SensorSnapshot::new([0, 100, 1023, 100, 0], false, 200.0, 0);
        assert!(!s.has_sensor_fault());
    }

    #[test]
    fn proximity_out_of_range_is_a_fault() {
        for cm in [1.9_f32, 400.1, -5.0, f32::NAN, f32::INFINITY] {
            let s = SensorSnapshot::new([0; 5], false, cm, 0);
            assert!(s.has_sensor_fault(), "proximity {cm} should fault");
        }
        // Boundary values are valid
        for cm in [2.0_f32, 400.0] {
            let s = SensorSnapshot::new([0; 5], false, cm, 0);
            assert!(!s.has_sensor_fault(), "proximity {cm} should be valid");
        }
    }

    #[test]
    fn ir_above_bit_range_is_a_fault() {
        let s = SensorSnapshot::new([0, 0, 1024, 0, 0], false, 100.0, 0);
        assert!(s.has_sensor_fault());
    }
}
