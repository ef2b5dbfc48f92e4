//! Bounded line-recovery state machine.
//!
//! Invoked only while the classifier reports line-lost. The search sweep
//! is a pure function of the entry direction and the elapsed tick count,
//! so a run is deterministic and resumable from its state alone.

use follower_traits::Side;
use tracing::{debug, warn};

use crate::config::RecoveryTuning;

/// Where the controller is in its search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Searching,
    /// Search budget spent; sticky until `reset()`.
    Exhausted,
}

/// What the controller wants this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Sweep(Side),
    Exhausted,
}

/// The only mutable state the engine carries across ticks. Owned by the
/// caller and passed into `decide` so independent engine instances never
/// interfere.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryState {
    phase: SearchPhase,
    /// Direction chosen at search entry (drift side of the last estimate).
    direction: Side,
    elapsed_ticks: u32,
    max_ticks: u32,
}

impl RecoveryState {
    pub fn new(tuning: &RecoveryTuning) -> Self {
        Self {
            phase: SearchPhase::Idle,
            direction: tuning.fallback_direction,
            elapsed_ticks: 0,
            max_ticks: tuning.max_ticks,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    /// Advance one line-lost tick.
    ///
    /// From `Idle` this enters `Searching`, picking the direction from the
    /// sign of `hint` (the last valid position before loss) or the
    /// configured fallback when no hint exists. Repeated calls in
    /// `Exhausted` keep returning `Exhausted`; there is no auto-resume.
    pub fn line_lost_tick(&mut self, tuning: &RecoveryTuning, hint: Option<f32>) -> SweepOutcome {
        match self.phase {
            SearchPhase::Exhausted => SweepOutcome::Exhausted,
            SearchPhase::Idle => {
                self.direction = match hint {
                    Some(p) if p < 0.0 => Side::Left,
                    Some(p) if p > 0.0 => Side::Right,
                    _ => tuning.fallback_direction,
                };
                self.phase = SearchPhase::Searching;
                self.elapsed_ticks = 1;
                debug!(direction = ?self.direction, "line lost, search started");
                SweepOutcome::Sweep(self.sweep_direction(tuning))
            }
            SearchPhase::Searching => {
                self.elapsed_ticks += 1;
                if self.elapsed_ticks > self.max_ticks {
                    self.phase = SearchPhase::Exhausted;
                    warn!(ticks = self.elapsed_ticks, "search budget exhausted");
                    SweepOutcome::Exhausted
                } else {
                    SweepOutcome::Sweep(self.sweep_direction(tuning))
                }
            }
        }
    }

    /// The line is visible again: leave `Searching`. `Exhausted` is not
    /// cleared here; that requires an explicit external `reset()`.
    pub fn line_visible(&mut self) {
        if self.phase == SearchPhase::Searching {
            debug!(ticks = self.elapsed_ticks, "line reacquired");
            self.phase = SearchPhase::Idle;
            self.elapsed_ticks = 0;
        }
    }

    /// External reset, e.g. the operator restarting the mission.
    pub fn reset(&mut self) {
        self.phase = SearchPhase::Idle;
        self.elapsed_ticks = 0;
    }

    /// Sweep direction for the current elapsed tick. With alternation on,
    /// segments double in length after each reversal (widening search);
    /// off, the sweep holds the entry direction.
    fn sweep_direction(&self, tuning: &RecoveryTuning) -> Side {
        if !tuning.alternate {
            return self.direction;
        }
        let mut seg = tuning.initial_sweep_ticks.max(1);
        let mut dir = self.direction;
        // 0-based offset into the search; elapsed_ticks >= 1 here.
        let mut off = self.elapsed_ticks - 1;
        while off >= seg {
            off -= seg;
            seg = seg.saturating_mul(2);
            dir = match dir {
                Side::Left => Side::Right,
                Side::Right => Side::Left,
            };
        }
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> RecoveryTuning {
        RecoveryTuning {
            max_ticks: 5,
            initial_sweep_ticks: 2,
            alternate: true,
            fallback_direction: Side::Right,
        }
    }

    #[test]
    fn enters_search_toward_drift_side() {
        let t = tuning();
        let mut st = RecoveryState::new(&t);
        assert_eq!(st.line_lost_tick(&t, Some(-0.4)), SweepOutcome::Sweep(Side::Left));
        assert_eq!(st.phase(), SearchPhase::Searching);
        assert_eq!(st.elapsed_ticks(), 1);
    }

    #[test]
    fn no_hint_uses_fallback() {
        let t = tuning();
        let mut st = RecoveryState::new(&t);
        assert_eq!(st.line_lost_tick(&t, None), SweepOutcome::Sweep(Side::Right));
    }

    #[test]
    fn sweep_alternates_with_doubling_segments() {
        let t = RecoveryTuning {
            max_ticks: 20,
            initial_sweep_ticks: 2,
            alternate: true,
            fallback_direction: Side::Right,
        };
        let mut st = RecoveryState::new(&t);
        let mut dirs = Vec::new();
        for _ in 0..8 {
            match st.line_lost_tick(&t, Some(-1.0)) {
                SweepOutcome::Sweep(d) => dirs.push(d),
                SweepOutcome::Exhausted => panic!("budget not spent yet"),
            }
        }
        // Segments: 2 left, 4 right, then left again.
        use Side::{Left as L, Right as R};
        assert_eq!(dirs, vec![L, L, R, R, R, R, L, L]);
    }

    #[test]
    fn single_direction_sweep_when_alternation_off() {
        let t = RecoveryTuning {
            alternate: false,
            ..tuning()
        };
        let mut st = RecoveryState::new(&t);
        for _ in 0..5 {
            assert_eq!(st.line_lost_tick(&t, Some(0.9)), SweepOutcome::Sweep(Side::Right));
        }
    }

    #[test]
    fn exhausts_after_budget_and_stays_exhausted() {
        let t = tuning();
        let mut st = RecoveryState::new(&t);
        for i in 1..=5 {
            assert!(
                matches!(st.line_lost_tick(&t, None), SweepOutcome::Sweep(_)),
                "tick {i} should still sweep"
            );
        }
        assert_eq!(st.line_lost_tick(&t, None), SweepOutcome::Exhausted);
        // Sticky: further calls and a visible line do not resume.
        assert_eq!(st.line_lost_tick(&t, None), SweepOutcome::Exhausted);
        st.line_visible();
        assert_eq!(st.phase(), SearchPhase::Exhausted);
        // External reset clears it.
        st.reset();
        assert_eq!(st.phase(), SearchPhase::Idle);
        assert!(matches!(st.line_lost_tick(&t, None), SweepOutcome::Sweep(_)));
    }

    #[test]
    fn reacquisition_resets_elapsed() {
        let t = tuning();
        let mut st = RecoveryState::new(&t);
        for _ in 0..4 {
            let _ = st.line_lost_tick(&t, None);
        }
        st.line_visible();
        assert_eq!(st.phase(), SearchPhase::Idle);
        assert_eq!(st.elapsed_ticks(), 0);
        // A later loss starts a fresh budget.
        assert!(matches!(st.line_lost_tick(&t, None), SweepOutcome::Sweep(_)));
        assert_eq!(st.elapsed_ticks(), 1);
    }
}
