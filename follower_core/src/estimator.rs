//! Line position estimation: intensity-weighted centroid over the five
//! IR channels.
//!
//! Weighting by raw intensity (not just binary activation) gives
//! sub-sensor-spacing precision and smooths the centroid as the line
//! drifts between sensors, avoiding the oscillation a
//! which-sensor-is-highest scheme produces.

use crate::classifier::Pattern;
use crate::config::Thresholds;

/// Fixed position weights for sensors far-left..far-right.
const WEIGHTS: [f32; 5] = [-2.0, -1.0, 0.0, 1.0, 2.0];

/// Derived estimate, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEstimate {
    /// Signed offset in [-1, 1]; negative = line left of center.
    pub position: f32,
    /// Signal strength in [0, 1]; 0 means no sensor is active.
    pub confidence: f32,
    pub pattern: Pattern,
}

/// Compute (position, confidence) from the IR array.
///
/// A sensor participates only when at or above `line_detected`. When no
/// sensor is active, confidence is 0 and the position is `held` (the last
/// valid estimate, carried by the engine) rather than snapping to zero;
/// that combination is what triggers line-lost handling downstream.
pub fn estimate(ir: &[u16; 5], thresholds: &Thresholds, held: Option<f32>) -> (f32, f32) {
    let mut weighted = 0.0_f32;
    let mut total = 0.0_f32;
    for (i, &v) in ir.iter().enumerate() {
        if v >= thresholds.line_detected {
            weighted += WEIGHTS[i] * f32::from(v);
            total += f32::from(v);
        }
    }

    if total <= 0.0 {
        return (held.unwrap_or(0.0), 0.0);
    }

    // Centroid lands in [-2, 2]; scale to [-1, 1].
    let position = (weighted / total / 2.0).clamp(-1.0, 1.0);
    let denom = 5.0 * f32::from(thresholds.very_strong_line.max(1));
    let confidence = (total / denom).min(1.0);
    (position, confidence)
}
