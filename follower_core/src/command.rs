//! The engine's sole output: one tagged command per tick, plus the
//! diagnostic rule that produced it.

use follower_traits::Side;

/// Why a `Stop` was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Collision,
    EmergencyProximity,
    Obstacle,
    SensorFault,
    LineLostExhausted,
}

impl StopReason {
    /// Terminal stops require external intervention; the run loop ends.
    /// Emergency/obstacle stops hold position and keep ticking, since the
    /// obstacle may clear on its own.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StopReason::Collision | StopReason::SensorFault | StopReason::LineLostExhausted
        )
    }
}

/// Motion command with abstract magnitudes in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Forward { speed: f32 },
    TurnLeft { speed: f32, intensity: f32 },
    TurnRight { speed: f32, intensity: f32 },
    /// Gentle differential steering while moving forward.
    CorrectLeft { magnitude: f32 },
    CorrectRight { magnitude: f32 },
    Stop { reason: StopReason },
    Reverse { speed: f32 },
    SearchSweep { direction: Side },
}

/// The arbitration rule that produced a command. Required output: this is
/// the primary means of testing priority order, not optional telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Collision,
    EmergencyProximity,
    Obstacle,
    SensorFault,
    Searching,
    LineLostExhausted,
    Intersection,
    WideLine,
    NormalTracking,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::Collision => "Collision",
            Rule::EmergencyProximity => "EmergencyProximity",
            Rule::Obstacle => "Obstacle",
            Rule::SensorFault => "SensorFault",
            Rule::Searching => "Searching",
            Rule::LineLostExhausted => "LineLostExhausted",
            Rule::Intersection => "Intersection",
            Rule::WideLine => "WideLine",
            Rule::NormalTracking => "NormalTracking",
        }
    }
}

impl core::fmt::Display for Rule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One tick's output: the command and the rule that fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub command: Command,
    pub rule: Rule,
}

impl Decision {
    pub fn new(command: Command, rule: Rule) -> Self {
        Self { command, rule }
    }

    /// True when the run loop should end after applying this command.
    pub fn is_terminal(&self) -> bool {
        matches!(self.command, Command::Stop { reason } if reason.is_terminal())
    }
}
