//! Mappings from the `follower_config` schema into core types.
//!
//! Kept in one place so the config crate never depends on the core and
//! the core never parses TOML.

use follower_traits::Side;

use crate::config::{ObstaclePolicy, RecoveryTuning, Speeds, Thresholds};

impl From<&follower_config::ThresholdsCfg> for Thresholds {
    fn from(t: &follower_config::ThresholdsCfg) -> Self {
        Self {
            line_detected: t.line_detected,
            strong_line: t.strong_line,
            very_strong_line: t.very_strong_line,
            intersection_threshold: t.intersection_threshold,
            wide_line_span: t.wide_line_span,
            turn_threshold_low: t.turn_threshold_low,
            turn_threshold_high: t.turn_threshold_high,
            proximity_obstacle_cm: t.proximity_obstacle_cm,
            proximity_emergency_cm: t.proximity_emergency_cm,
            obstacle_policy: t.obstacle_policy.into(),
        }
    }
}

impl From<follower_config::ObstaclePolicy> for ObstaclePolicy {
    fn from(p: follower_config::ObstaclePolicy) -> Self {
        match p {
            follower_config::ObstaclePolicy::Backup => Self::Backup,
            follower_config::ObstaclePolicy::Halt => Self::Halt,
        }
    }
}

impl From<&follower_config::SpeedsCfg> for Speeds {
    fn from(s: &follower_config::SpeedsCfg) -> Self {
        Self {
            cruise: s.cruise,
            reduced: s.reduced,
            turn: s.turn,
            search: s.search,
            reverse: s.reverse,
        }
    }
}

impl From<&follower_config::RecoveryCfg> for RecoveryTuning {
    fn from(r: &follower_config::RecoveryCfg) -> Self {
        Self {
            max_ticks: r.max_ticks,
            initial_sweep_ticks: r.initial_sweep_ticks,
            alternate: r.alternate,
            fallback_direction: match r.fallback_direction {
                follower_config::FallbackDirection::Left => Side::Left,
                follower_config::FallbackDirection::Right => Side::Right,
            },
        }
    }
}
