//! The decision engine: strict priority arbitration over one snapshot
//! per tick.
//!
//! Priority order (each step short-circuits):
//! 1. safety arbiter (bump / fault / proximity)
//! 2. sticky recovery exhaustion
//! 3. line-lost -> recovery controller
//! 4. intersection -> cross at reduced speed
//! 5. wide line -> forward with slack steering
//! 6. normal tracking by position magnitude
//!
//! The rule order itself defines the tie-breaks; keep it a
//! cascade, not a dispatch table.

use std::marker::PhantomData;

use tracing::trace;

use crate::classifier::{self, Pattern};
use crate::command::{Command, Decision, Rule, StopReason};
use crate::config::{RecoveryTuning, Speeds, Thresholds};
use crate::error::{BuildError, Result};
use crate::estimator::{self, LineEstimate};
use crate::recovery::{RecoveryState, SweepOutcome};
use crate::safety;
use crate::snapshot::SensorSnapshot;

pub struct DecisionEngine {
    thresholds: Thresholds,
    speeds: Speeds,
    recovery: RecoveryTuning,
    /// Held across ticks as the recovery direction hint; the only other
    /// carried state (`RecoveryState`) is owned by the caller.
    last_valid_position: Option<f32>,
    last_estimate: Option<LineEstimate>,
}

impl core::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("last_valid_position", &self.last_valid_position)
            .finish()
    }
}

impl DecisionEngine {
    /// Start building an engine. Thresholds are mandatory; there are no
    /// built-in safety defaults.
    pub fn builder() -> EngineBuilder<Missing> {
        EngineBuilder::default()
    }

    /// A fresh recovery state sized from this engine's tuning.
    pub fn new_recovery_state(&self) -> RecoveryState {
        RecoveryState::new(&self.recovery)
    }

    pub fn speeds(&self) -> &Speeds {
        &self.speeds
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Diagnostics: the last tick's full estimate, if any.
    pub fn last_estimate(&self) -> Option<LineEstimate> {
        self.last_estimate
    }

    /// One arbitration pass. Always returns exactly one command; never
    /// panics and never blocks.
    pub fn decide(&mut self, snapshot: &SensorSnapshot, recovery: &mut RecoveryState) -> Decision {
        // 1. Safety: on any hit, recovery state is untouched.
        if let Some(decision) = safety::evaluate(snapshot, &self.thresholds, &self.speeds) {
            trace!(tick = snapshot.tick, rule = %decision.rule, "safety arbiter fired");
            self.last_estimate = None;
            return decision;
        }

        let pattern = classifier::classify(&snapshot.ir, &self.thresholds);
        let (position, confidence) =
            estimator::estimate(&snapshot.ir, &self.thresholds, self.last_valid_position);
        if confidence > 0.0 {
            self.last_valid_position = Some(position);
        }
        self.last_estimate = Some(LineEstimate {
            position,
            confidence,
            pattern,
        });
        trace!(
            tick = snapshot.tick,
            position,
            confidence,
            pattern = ?pattern,
            "estimate"
        );

        // 2. A spent search budget halts the vehicle until external reset,
        // even if the line drifts back under the array on its own.
        if matches!(recovery.phase(), crate::recovery::SearchPhase::Exhausted) {
            return Decision::new(
                Command::Stop {
                    reason: StopReason::LineLostExhausted,
                },
                Rule::LineLostExhausted,
            );
        }

        match pattern {
            Pattern::LineLost => {
                match recovery.line_lost_tick(&self.recovery, self.last_valid_position) {
                    SweepOutcome::Sweep(direction) => {
                        Decision::new(Command::SearchSweep { direction }, Rule::Searching)
                    }
                    SweepOutcome::Exhausted => Decision::new(
                        Command::Stop {
                            reason: StopReason::LineLostExhausted,
                        },
                        Rule::LineLostExhausted,
                    ),
                }
            }
            Pattern::Intersection => {
                recovery.line_visible();
                // Crossing straight through at reduced speed is the safe
                // default absent higher-level path selection.
                Decision::new(
                    Command::Forward {
                        speed: self.speeds.reduced,
                    },
                    Rule::Intersection,
                )
            }
            Pattern::WideLine => {
                recovery.line_visible();
                self.wide_line_decision(position)
            }
            Pattern::None => {
                recovery.line_visible();
                self.tracking_decision(position)
            }
        }
    }

    /// Wide lines tolerate larger positional slack: correct only past the
    /// hard turn threshold, and then only gently.
    fn wide_line_decision(&self, position: f32) -> Decision {
        let magnitude = position.abs().min(1.0);
        let command = if magnitude < self.thresholds.turn_threshold_high {
            Command::Forward {
                speed: self.speeds.cruise,
            }
        } else if position < 0.0 {
            Command::CorrectLeft { magnitude }
        } else {
            Command::CorrectRight { magnitude }
        };
        Decision::new(command, Rule::WideLine)
    }

    /// Normal tracking: map |position| through the two turn thresholds.
    /// Negative position means the line is left of center.
    fn tracking_decision(&self, position: f32) -> Decision {
        let magnitude = position.abs().min(1.0);
        let command = if magnitude < self.thresholds.turn_threshold_low {
            Command::Forward {
                speed: self.speeds.cruise,
            }
        } else if magnitude < self.thresholds.turn_threshold_high {
            if position < 0.0 {
                Command::CorrectLeft { magnitude }
            } else {
                Command::CorrectRight { magnitude }
            }
        } else if position < 0.0 {
            Command::TurnLeft {
                speed: self.speeds.turn,
                intensity: magnitude,
            }
        } else {
            Command::TurnRight {
                speed: self.speeds.turn,
                intensity: magnitude,
            }
        };
        Decision::new(command, Rule::NormalTracking)
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `DecisionEngine`. Thresholds advance the type-state; all
/// cross-field invariants are validated in `try_build`.
pub struct EngineBuilder<T> {
    thresholds: Option<Thresholds>,
    speeds: Option<Speeds>,
    recovery: Option<RecoveryTuning>,
    _t: PhantomData<T>,
}

impl Default for EngineBuilder<Missing> {
    fn default() -> Self {
        Self {
            thresholds: None,
            speeds: None,
            recovery: None,
            _t: PhantomData,
        }
    }
}

impl<T> EngineBuilder<T> {
    pub fn with_speeds(mut self, speeds: Speeds) -> Self {
        self.speeds = Some(speeds);
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryTuning) -> Self {
        self.recovery = Some(recovery);
        self
    }

    /// Fallible build available in any type-state; returns a typed
    /// `BuildError` for missing or contradictory configuration.
    pub fn try_build(self) -> Result<DecisionEngine> {
        let thresholds = self
            .thresholds
            .ok_or_else(|| eyre::Report::new(BuildError::MissingThresholds))?;
        let speeds = self.speeds.unwrap_or_default();
        let recovery = self.recovery.unwrap_or_default();

        validate_thresholds(&thresholds)?;
        validate_speeds(&speeds)?;
        if recovery.max_ticks == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "recovery.max_ticks must be >= 1",
            )));
        }
        if recovery.initial_sweep_ticks == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "recovery.initial_sweep_ticks must be >= 1",
            )));
        }

        Ok(DecisionEngine {
            thresholds,
            speeds,
            recovery,
            last_valid_position: None,
            last_estimate: None,
        })
    }
}

impl EngineBuilder<Missing> {
    pub fn with_thresholds(self, thresholds: Thresholds) -> EngineBuilder<Set> {
        EngineBuilder {
            thresholds: Some(thresholds),
            speeds: self.speeds,
            recovery: self.recovery,
            _t: PhantomData,
        }
    }
}

impl EngineBuilder<Set> {
    /// Validate and build. Only available once thresholds are set.
    pub fn build(self) -> Result<DecisionEngine> {
        self.try_build()
    }
}

fn validate_thresholds(t: &Thresholds) -> Result<()> {
    if t.line_detected == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "line_detected must be > 0",
        )));
    }
    if t.strong_line < t.line_detected {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "strong_line must be >= line_detected",
        )));
    }
    if t.very_strong_line < t.strong_line {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "very_strong_line must be >= strong_line",
        )));
    }
    if t.wide_line_span == 0 || t.wide_line_span > 5 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "wide_line_span must be in 1..=5",
        )));
    }
    if !t.turn_threshold_low.is_finite() || t.turn_threshold_low < 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "turn_threshold_low must be >= 0",
        )));
    }
    if !t.turn_threshold_high.is_finite()
        || t.turn_threshold_high <= t.turn_threshold_low
        || t.turn_threshold_high > 1.0
    {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "turn_threshold_high must be in (turn_threshold_low, 1.0]",
        )));
    }
    if !t.proximity_obstacle_cm.is_finite() || t.proximity_obstacle_cm <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "proximity_obstacle_cm must be > 0",
        )));
    }
    if !t.proximity_emergency_cm.is_finite() || t.proximity_emergency_cm <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "proximity_emergency_cm must be > 0",
        )));
    }
    // The obstacle band must enclose the emergency band, otherwise the
    // emergency stop could never fire before the obstacle response.
    if t.proximity_emergency_cm >= t.proximity_obstacle_cm {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "proximity_emergency_cm must be < proximity_obstacle_cm",
        )));
    }
    Ok(())
}

fn validate_speeds(s: &Speeds) -> Result<()> {
    for v in [s.cruise, s.reduced, s.turn, s.search, s.reverse] {
        if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "speed magnitudes must be in [0.0, 1.0]",
            )));
        }
    }
    Ok(())
}
