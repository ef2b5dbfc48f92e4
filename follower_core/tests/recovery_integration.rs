//! Recovery behavior driven through the full engine, tick by tick.

use follower_core::command::{Command, Rule, StopReason};
use follower_core::config::{ObstaclePolicy, RecoveryTuning, Thresholds};
use follower_core::engine::DecisionEngine;
use follower_core::recovery::SearchPhase;
use follower_core::snapshot::SensorSnapshot;
use follower_traits::Side;

fn thresholds() -> Thresholds {
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
        obstacle_policy: ObstaclePolicy::Backup,
    }
}

fn engine(max_ticks: u32) -> DecisionEngine {
    DecisionEngine::builder()
        .with_thresholds(thresholds())
        .with_recovery(RecoveryTuning {
            max_ticks,
            initial_sweep_ticks: 2,
            alternate: true,
            fallback_direction: Side::Right,
        })
        .build()
        .unwrap()
}

fn lost(tick: u64) -> SensorSnapshot {
    SensorSnapshot::new([100, 100, 100, 100, 100], false, 200.0, tick)
}

fn line_left(tick: u64) -> SensorSnapshot {
    SensorSnapshot::new([900, 500, 100, 100, 100], false, 200.0, tick)
}

fn line_center(tick: u64) -> SensorSnapshot {
    SensorSnapshot::new([100, 100, 900, 100, 100], false, 200.0, tick)
}

#[test]
fn search_starts_toward_last_seen_side() {
    let mut e = engine(10);
    let mut rec = e.new_recovery_state();

    // Track a line drifting off the left edge, then lose it.
    let d = e.decide(&line_left(0), &mut rec);
    assert!(matches!(
        d.command,
        Command::TurnLeft { .. } | Command::CorrectLeft { .. }
    ));

    let d = e.decide(&lost(1), &mut rec);
    assert_eq!(d.rule, Rule::Searching);
    assert_eq!(
        d.command,
        Command::SearchSweep {
            direction: Side::Left
        }
    );
}

#[test]
fn search_without_history_uses_fallback_direction() {
    let mut e = engine(10);
    let mut rec = e.new_recovery_state();
    let d = e.decide(&lost(0), &mut rec);
    assert_eq!(
        d.command,
        Command::SearchSweep {
            direction: Side::Right
        }
    );
}

#[test]
fn exhaustion_fires_exactly_after_budget() {
    let mut e = engine(5);
    let mut rec = e.new_recovery_state();

    for tick in 0..5 {
        let d = e.decide(&lost(tick), &mut rec);
        assert_eq!(d.rule, Rule::Searching, "tick {tick} still within budget");
    }
    let d = e.decide(&lost(5), &mut rec);
    assert_eq!(d.rule, Rule::LineLostExhausted);
    assert_eq!(
        d.command,
        Command::Stop {
            reason: StopReason::LineLostExhausted
        }
    );
    assert!(d.is_terminal());
}

#[test]
fn exhaustion_is_sticky_even_when_line_returns() {
    let mut e = engine(3);
    let mut rec = e.new_recovery_state();

    for tick in 0..4 {
        let _ = e.decide(&lost(tick), &mut rec);
    }
    assert_eq!(rec.phase(), SearchPhase::Exhausted);

    // The line drifting back under the array does not resume the run.
    let d = e.decide(&line_center(4), &mut rec);
    assert_eq!(d.rule, Rule::LineLostExhausted);

    // An explicit external reset does.
    rec.reset();
    let d = e.decide(&line_center(5), &mut rec);
    assert_eq!(d.rule, Rule::NormalTracking);
}

#[test]
fn reacquisition_before_budget_resumes_and_resets() {
    let mut e = engine(5);
    let mut rec = e.new_recovery_state();

    for tick in 0..4 {
        let d = e.decide(&lost(tick), &mut rec);
        assert_eq!(d.rule, Rule::Searching);
    }

    // Line returns on the reacquisition tick itself: normal tracking,
    // not one more sweep.
    let d = e.decide(&line_center(4), &mut rec);
    assert_eq!(d.rule, Rule::NormalTracking);
    assert_eq!(rec.phase(), SearchPhase::Idle);

    // The next loss gets a fresh budget.
    for tick in 5..10 {
        let d = e.decide(&lost(tick), &mut rec);
        assert_eq!(d.rule, Rule::Searching, "tick {tick} fresh budget");
    }
}

#[test]
fn safety_interruption_freezes_the_search_budget() {
    let mut e = engine(5);
    let mut rec = e.new_recovery_state();

    let _ = e.decide(&lost(0), &mut rec);
    let _ = e.decide(&lost(1), &mut rec);

    // Several obstacle-band ticks while searching: budget must not move.
    let blocked = SensorSnapshot::new([100; 5], false, 40.0, 2);
    for _ in 0..3 {
        let d = e.decide(&blocked, &mut rec);
        assert_eq!(d.rule, Rule::Obstacle);
    }
    assert_eq!(rec.elapsed_ticks(), 2);

    // Obstacle clears, line still lost: the search picks up where it was.
    let d = e.decide(&lost(5), &mut rec);
    assert_eq!(d.rule, Rule::Searching);
    assert_eq!(rec.elapsed_ticks(), 3);
}
