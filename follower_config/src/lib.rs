#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and scenario parsing for the line follower.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The scenario CSV loader enforces strict headers so recorded sensor
//!   traces replay byte-for-byte deterministically.
use serde::Deserialize;

/// Scenario CSV schema, one row per control tick.
///
/// Expected headers:
/// ir1,ir2,ir3,ir4,ir5,bump,proximity_cm
///
/// Example:
/// ir1,ir2,ir3,ir4,ir5,bump,proximity_cm
/// 150,200,800,200,150,0,250.0
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ScenarioRow {
    pub ir1: u16,
    pub ir2: u16,
    pub ir3: u16,
    pub ir4: u16,
    pub ir5: u16,
    /// 0 = clear, anything else = contact
    pub bump: u8,
    pub proximity_cm: f32,
}

impl ScenarioRow {
    pub fn ir(&self) -> [u16; 5] {
        [self.ir1, self.ir2, self.ir3, self.ir4, self.ir5]
    }
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// IR channels far-left..far-right (BCM numbering)
    pub ir: [u8; 5],
    pub bump: u8,
    pub ultrasonic_trig: u8,
    pub ultrasonic_echo: u8,
    pub motor_left_fwd: u8,
    pub motor_left_rev: u8,
    pub motor_right_fwd: u8,
    pub motor_right_rev: u8,
    pub motor_left_en: Option<u8>,
    pub motor_right_en: Option<u8>,
}

/// IR and proximity thresholds; mirrored into the core at engine build.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ThresholdsCfg {
    /// Minimum IR reading counted as "on line"
    pub line_detected: u16,
    /// Reading treated as a strong, unambiguous line signal
    pub strong_line: u16,
    /// Reading near sensor saturation; scales the confidence estimate
    pub very_strong_line: u16,
    /// Per-sensor level above which a flooded array reads as an intersection
    pub intersection_threshold: u16,
    /// Consecutive strong sensors required before a line counts as "wide"
    pub wide_line_span: u8,
    /// |position| below this tracks straight ahead
    pub turn_threshold_low: f32,
    /// |position| at or above this commands a pivot turn
    pub turn_threshold_high: f32,
    /// Obstacle response engages at or below this range (cm)
    pub proximity_obstacle_cm: f32,
    /// Hard emergency stop at or below this range (cm)
    pub proximity_emergency_cm: f32,
    /// What to do inside the obstacle band: back away or hold position
    #[serde(default)]
    pub obstacle_policy: ObstaclePolicy,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ObstaclePolicy {
    #[default]
    Backup,
    Halt,
}

/// Abstract command magnitudes in [0.0, 1.0]; the drive maps them to PWM.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SpeedsCfg {
    pub cruise: f32,
    /// Reduced speed used through intersections
    pub reduced: f32,
    pub turn: f32,
    pub search: f32,
    pub reverse: f32,
}

impl Default for SpeedsCfg {
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

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RecoveryCfg {
    /// Search budget in ticks before giving up
    pub max_ticks: u32,
    /// Length of the first sweep segment; doubles on each reversal
    pub initial_sweep_ticks: u32,
    /// Alternate sweep direction (widening) vs. single-direction sweep
    pub alternate: bool,
    /// Direction used when no prior position hint exists
    pub fallback_direction: FallbackDirection,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackDirection {
    Left,
    #[default]
    Right,
}

impl Default for RecoveryCfg {
    fn default() -> Self {
        Self {
            max_ticks: 40,
            initial_sweep_ticks: 6,
            alternate: true,
            fallback_direction: FallbackDirection::Right,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Timeouts {
    /// Max sensor wait per read (ms)
    pub sensor_ms: u64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Direct,
    Sampled,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop rate in Hz
    pub tick_rate_hz: u32,
    /// Sensor acquisition mode: in-loop reads or background sampler thread
    pub mode: RunMode,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            mode: RunMode::Direct,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    pub thresholds: ThresholdsCfg,
    #[serde(default)]
    pub speeds: SpeedsCfg,
    #[serde(default)]
    pub recovery: RecoveryCfg,
    pub timeouts: Timeouts,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub runner: RunnerCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        let t = &self.thresholds;

        // Thresholds: the same cross-field invariants the core re-checks at
        // engine build; failing here gives a friendlier error path.
        if t.line_detected == 0 {
            eyre::bail!("thresholds.line_detected must be > 0");
        }
        if t.strong_line < t.line_detected {
            eyre::bail!("thresholds.strong_line must be >= line_detected");
        }
        if t.very_strong_line < t.strong_line {
            eyre::bail!("thresholds.very_strong_line must be >= strong_line");
        }
        if t.wide_line_span == 0 || t.wide_line_span > 5 {
            eyre::bail!("thresholds.wide_line_span must be in 1..=5");
        }
        if !(t.turn_threshold_low >= 0.0 && t.turn_threshold_low <= 1.0) {
            eyre::bail!("thresholds.turn_threshold_low must be in [0.0, 1.0]");
        }
        if t.turn_threshold_high <= t.turn_threshold_low || t.turn_threshold_high > 1.0 {
            eyre::bail!("thresholds.turn_threshold_high must be in (turn_threshold_low, 1.0]");
        }
        if t.proximity_obstacle_cm <= 0.0 || t.proximity_emergency_cm <= 0.0 {
            eyre::bail!("proximity thresholds must be > 0");
        }
        if t.proximity_emergency_cm >= t.proximity_obstacle_cm {
            eyre::bail!(
                "thresholds.proximity_emergency_cm must be < proximity_obstacle_cm \
                 (the obstacle band must enclose the emergency band)"
            );
        }

        // Speeds
        let s = &self.speeds;
        for (name, v) in [
            ("cruise", s.cruise),
            ("reduced", s.reduced),
            ("turn", s.turn),
            ("search", s.search),
            ("reverse", s.reverse),
        ] {
            if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
                eyre::bail!("speeds.{name} must be in [0.0, 1.0]");
            }
        }

        // Recovery
        if self.recovery.max_ticks == 0 {
            eyre::bail!("recovery.max_ticks must be >= 1");
        }
        if self.recovery.initial_sweep_ticks == 0 {
            eyre::bail!("recovery.initial_sweep_ticks must be >= 1");
        }

        // Runner
        if self.runner.tick_rate_hz == 0 {
            eyre::bail!("runner.tick_rate_hz must be > 0");
        }
        if self.runner.tick_rate_hz > 1000 {
            eyre::bail!("runner.tick_rate_hz is unreasonably high (>1kHz)");
        }

        // Timeouts
        if self.timeouts.sensor_ms == 0 {
            eyre::bail!("timeouts.sensor_ms must be >= 1");
        }

        Ok(())
    }
}

pub fn load_scenario_csv(path: &std::path::Path) -> eyre::Result<Vec<ScenarioRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open scenario CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["ir1", "ir2", "ir3", "ir4", "ir5", "bump", "proximity_cm"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "scenario CSV must have headers 'ir1,ir2,ir3,ir4,ir5,bump,proximity_cm', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScenarioRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    if rows.is_empty() {
        eyre::bail!("scenario CSV {:?} has no data rows", path);
    }

    Ok(rows)
}
