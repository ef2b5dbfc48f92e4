//! Priority-order tests: when several conditions hold at once, exactly
//! one rule fires, and always the highest-priority one.

use follower_core::command::{Command, Rule, StopReason};
use follower_core::config::{ObstaclePolicy, Speeds, Thresholds};
use follower_core::engine::DecisionEngine;
use follower_core::snapshot::SensorSnapshot;
use rstest::rstest;

fn thresholds(policy: ObstaclePolicy) -> Thresholds {
    Thresholds {
        line_detected: 400,
        strong_line: 600,
        very_strong_line: 800,
        intersection_threshold: 700,
        wide_line_span: 3,
        turn_threshold_low: 0.2,
        turn_threshold_high: 0.6,
        proximity_obstacle_cm: 50.0,
        proximity_emergency_cm: 25.0,
        obstacle_policy: policy,
    }
}

fn engine(policy: ObstaclePolicy) -> DecisionEngine {
    DecisionEngine::builder()
        .with_thresholds(thresholds(policy))
        .with_speeds(Speeds::default())
        .build()
        .unwrap()
}

#[test]
fn bump_dominates_everything() {
    let mut e = engine(ObstaclePolicy::Backup);
    let mut rec = e.new_recovery_state();
    // Bump plus emergency proximity plus a clean centered line: the bump
    // wins and the decision carries its reason.
    let s = SensorSnapshot::new([0, 0, 900, 0, 0], true, 10.0, 0);
    let d = e.decide(&s, &mut rec);
    assert_eq!(d.rule, Rule::Collision);
    assert_eq!(
        d.command,
        Command::Stop {
            reason: StopReason::Collision
        }
    );
    assert!(d.is_terminal());
}

#[test]
fn sensor_fault_beats_proximity() {
    let mut e = engine(ObstaclePolicy::Backup);
    let mut rec = e.new_recovery_state();
    // Proximity NaN is itself the fault; the decision must be the typed
    // fault stop, not an emergency-proximity stop.
    let s = SensorSnapshot::new([0, 0, 900, 0, 0], false, f32::NAN, 0);
    let d = e.decide(&s, &mut rec);
    assert_eq!(d.rule, Rule::SensorFault);
    assert!(d.is_terminal());
}

#[rstest]
#[case(10.0, Rule::EmergencyProximity)]
#[case(25.0, Rule::EmergencyProximity)] // boundary is inclusive
#[case(25.1, Rule::Obstacle)]
#[case(50.0, Rule::Obstacle)] // boundary is inclusive
#[case(50.1, Rule::NormalTracking)]
fn proximity_bands(#[case] cm: f32, #[case] expected: Rule) {
    let mut e = engine(ObstaclePolicy::Backup);
    let mut rec = e.new_recovery_state();
    let s = SensorSnapshot::new([0, 0, 900, 0, 0], false, cm, 0);
    let d = e.decide(&s, &mut rec);
    assert_eq!(d.rule, expected, "proximity {cm}");
}

#[test]
fn obstacle_policy_selects_backup_or_halt() {
    let s = SensorSnapshot::new([0, 0, 900, 0, 0], false, 40.0, 0);

    let mut e = engine(ObstaclePolicy::Backup);
    let mut rec = e.new_recovery_state();
    let d = e.decide(&s, &mut rec);
    assert_eq!(d.rule, Rule::Obstacle);
    assert!(matches!(d.command, Command::Reverse { .. }));
    assert!(!d.is_terminal());

    let mut e = engine(ObstaclePolicy::Halt);
    let mut rec = e.new_recovery_state();
    let d = e.decide(&s, &mut rec);
    assert_eq!(d.rule, Rule::Obstacle);
    assert_eq!(
        d.command,
        Command::Stop {
            reason: StopReason::Obstacle
        }
    );
    assert!(!d.is_terminal());
}

#[test]
fn safety_hit_leaves_recovery_state_untouched() {
    let mut e = engine(ObstaclePolicy::Backup);
    let mut rec = e.new_recovery_state();

    // Lose the line for two ticks to start a search.
    let lost = SensorSnapshot::new([0; 5], false, 200.0, 0);
    let _ = e.decide(&lost, &mut rec);
    let _ = e.decide(&lost, &mut rec);
    let elapsed = rec.elapsed_ticks();
    assert!(elapsed >= 2);

    // A bump mid-search must not advance or reset the search budget.
    let bumped = SensorSnapshot::new([0; 5], true, 200.0, 2);
    let d = e.decide(&bumped, &mut rec);
    assert_eq!(d.rule, Rule::Collision);
    assert_eq!(rec.elapsed_ticks(), elapsed);
}

#[test]
fn emergency_stop_then_clear_resumes_tracking() {
    let mut e = engine(ObstaclePolicy::Backup);
    let mut rec = e.new_recovery_state();

    let blocked = SensorSnapshot::new([0, 0, 900, 0, 0], false, 20.0, 0);
    let d = e.decide(&blocked, &mut rec);
    assert_eq!(d.rule, Rule::EmergencyProximity);
    assert!(!d.is_terminal());

    let clear = SensorSnapshot::new([0, 0, 900, 0, 0], false, 200.0, 1);
    let d = e.decide(&clear, &mut rec);
    assert_eq!(d.rule, Rule::NormalTracking);
    assert!(matches!(d.command, Command::Forward { .. }));
}
