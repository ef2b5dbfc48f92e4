//! Safety arbitration: bump, sensor faults, and proximity bands.
//!
//! Pure and stateless; evaluated before any line-following logic and
//! short-circuits everything downstream when it fires.

use crate::command::{Command, Decision, Rule, StopReason};
use crate::config::{ObstaclePolicy, Speeds, Thresholds};
use crate::snapshot::SensorSnapshot;

/// Inspect bump, fault, and proximity conditions.
///
/// Priority within the arbiter:
/// 1. bump contact (absolute, overrides everything including faults)
/// 2. out-of-range readings -> `Stop { SensorFault }`
/// 3. proximity at or below the emergency band -> hard stop
/// 4. proximity at or below the obstacle band -> policy response
///
/// Returns `None` when no safety condition holds.
pub fn evaluate(snapshot: &SensorSnapshot, t: &Thresholds, speeds: &Speeds) -> Option<Decision> {
    if snapshot.bump {
        return Some(Decision::new(
            Command::Stop {
                reason: StopReason::Collision,
            },
            Rule::Collision,
        ));
    }

    if snapshot.has_sensor_fault() {
        return Some(Decision::new(
            Command::Stop {
                reason: StopReason::SensorFault,
            },
            Rule::SensorFault,
        ));
    }

    if snapshot.proximity_cm <= t.proximity_emergency_cm {
        return Some(Decision::new(
            Command::Stop {
                reason: StopReason::EmergencyProximity,
            },
            Rule::EmergencyProximity,
        ));
    }

    if snapshot.proximity_cm <= t.proximity_obstacle_cm {
        let command = match t.obstacle_policy {
            ObstaclePolicy::Backup => Command::Reverse {
                speed: speeds.reverse,
            },
            ObstaclePolicy::Halt => Command::Stop {
                reason: StopReason::Obstacle,
            },
        };
        return Some(Decision::new(command, Rule::Obstacle));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(policy: ObstaclePolicy) -> Thresholds {
        Thresholds {
            line_detected: 400,
            strong_line: 600,
            very_strong_line: 800,
            intersection_threshold: 700,
            wide_line_span: 3,
            turn_threshold_low: 0.2,
            turn_threshold_high: 0.5,
            proximity_obstacle_cm: 50.0,
            proximity_emergency_cm: 25.0,
            obstacle_policy: policy,
        }
    }

    #[test]
    fn bump_overrides_everything() {
        // Even a faulted proximity reading loses to a bump contact.
        let s = SensorSnapshot::new([1023; 5], true, -1.0, 0);
        let d = evaluate(&s, &thresholds(ObstaclePolicy::Backup), &Speeds::default())
            .expect("safety decision");
        assert_eq!(d.rule, Rule::Collision);
        assert!(matches!(
            d.command,
            Command::Stop {
                reason: StopReason::Collision
            }
        ));
    }

    #[test]
    fn faulted_proximity_stops_rather_than_passing_through() {
        let s = SensorSnapshot::new([0; 5], false, 500.0, 0);
        let d = evaluate(&s, &thresholds(ObstaclePolicy::Backup), &Speeds::default())
            .expect("safety decision");
        assert_eq!(d.rule, Rule::SensorFault);
    }

    #[test]
    fn emergency_band_beats_obstacle_band() {
        let s = SensorSnapshot::new([0; 5], false, 20.0, 0);
        let d = evaluate(&s, &thresholds(ObstaclePolicy::Backup), &Speeds::default())
            .expect("safety decision");
        assert_eq!(d.rule, Rule::EmergencyProximity);
    }

    #[test]
    fn obstacle_policy_selects_backup_or_halt() {
        let s = SensorSnapshot::new([0; 5], false, 40.0, 0);
        let speeds = Speeds::default();

        let d = evaluate(&s, &thresholds(ObstaclePolicy::Backup), &speeds).expect("backup");
        assert_eq!(d.rule, Rule::Obstacle);
        assert!(matches!(d.command, Command::Reverse { speed } if speed == speeds.reverse));

        let d = evaluate(&s, &thresholds(ObstaclePolicy::Halt), &speeds).expect("halt");
        assert_eq!(d.rule, Rule::Obstacle);
        assert!(matches!(
            d.command,
            Command::Stop {
                reason: StopReason::Obstacle
            }
        ));
    }

    #[test]
    fn clear_path_yields_nothing() {
        let s = SensorSnapshot::new([0; 5], false, 200.0, 0);
        assert!(evaluate(&s, &thresholds(ObstaclePolicy::Backup), &Speeds::default()).is_none());
    }
}
