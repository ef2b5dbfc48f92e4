//! Engine configuration types.
//!
//! Deliberately no `Default` for `Thresholds`: safety bounds always come
//! from the caller and are validated at engine build, never assumed.

use follower_traits::Side;

/// Response inside the obstacle proximity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstaclePolicy {
    /// Back away slowly until the range opens up.
    Backup,
    /// Hold position and wait.
    Halt,
}

/// IR and proximity thresholds plus steering breakpoints.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Minimum IR reading counted as "on line".
    pub line_detected: u16,
    /// Reading treated as a strong, unambiguous line signal.
    pub strong_line: u16,
    /// Reading near sensor saturation; scales the confidence estimate.
    pub very_strong_line: u16,
    /// Per-sensor level above which a flooded array reads as an intersection.
    pub intersection_threshold: u16,
    /// Consecutive strong sensors required before a line counts as "wide".
    pub wide_line_span: u8,
    /// |position| below this tracks straight ahead.
    pub turn_threshold_low: f32,
    /// |position| at or above this commands a pivot turn.
    pub turn_threshold_high: f32,
    /// Obstacle response engages at or below this range (cm).
    pub proximity_obstacle_cm: f32,
    /// Hard emergency stop at or below this range (cm).
    pub proximity_emergency_cm: f32,
    pub obstacle_policy: ObstaclePolicy,
}

/// Abstract speed magnitudes handed to the actuator layer, all in [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct Speeds {
    pub cruise: f32,
    /// Reduced speed used to cross intersections.
    pub reduced: f32,
    pub turn: f32,
    pub search: f32,
    pub reverse: f32,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            cruise: 0.5,
            reduced: 0.3,
            turn: 0.4,
            search: 0.35,
            reverse: 0.3,
        }
    }
}

/// Recovery search tuning.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryTuning {
    /// Search budget in ticks before the controller gives up.
    pub max_ticks: u32,
    /// Length of the first sweep segment; doubles on each reversal.
    pub initial_sweep_ticks: u32,
    /// Alternate sweep direction (widening) vs. single-direction sweep.
    pub alternate: bool,
    /// Direction used when no prior position hint exists.
    pub fallback_direction: Side,
}

impl Default for RecoveryTuning {
    fn default() -> Self {
        Self {
            max_ticks: 40,
            initial_sweep_ticks: 6,
            alternate: true,
            fallback_direction: Side::Right,
        }
    }
}
