//! Mission wiring: config mapping, sensor/drive assembly, run execution.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use follower_config::{Config, RunMode, ScenarioRow};
use follower_core::config::{RecoveryTuning, Speeds, Thresholds};
use follower_core::engine::DecisionEngine;
use follower_core::error::Result as CoreResult;
use follower_core::runner::{RunParams, RunSummary, SamplingMode};
use follower_hardware::PlaybackArray;
use follower_traits::clock::MonotonicClock;

/// Build the decision engine from the validated config.
pub fn build_engine(cfg: &Config) -> CoreResult<DecisionEngine> {
    let thresholds: Thresholds = (&cfg.thresholds).into();
    let speeds: Speeds = (&cfg.speeds).into();
    let recovery: RecoveryTuning = (&cfg.recovery).into();
    DecisionEngine::builder()
        .with_thresholds(thresholds)
        .with_speeds(speeds)
        .with_recovery(recovery)
        .build()
}

/// Run a live follow, on GPIO hardware when built with the `hardware`
/// feature and on the simulated track otherwise.
pub fn run_live(
    cfg: &Config,
    tick_rate_override: Option<u32>,
    max_ticks: Option<u64>,
    direct: bool,
    shutdown: &AtomicBool,
) -> CoreResult<RunSummary> {
    let mut engine = build_engine(cfg)?;
    let tick_rate_hz = tick_rate_override.unwrap_or(cfg.runner.tick_rate_hz);
    let mode = if direct {
        SamplingMode::Direct
    } else {
        match cfg.runner.mode {
            RunMode::Direct => SamplingMode::Direct,
            RunMode::Sampled => SamplingMode::Sampled { hz: tick_rate_hz },
        }
    };
    let params = RunParams {
        tick_rate_hz,
        sensor_timeout: Duration::from_millis(cfg.timeouts.sensor_ms),
        max_ticks,
        mode,
    };
    tracing::info!(tick_rate_hz, ?mode, "follow start");

    #[cfg(feature = "hardware")]
    {
        let array =
            follower_hardware::gpio::GpioSensorArray::new(&cfg.pins).map_err(eyre::Report::new)?;
        let mut drive =
            follower_hardware::gpio::GpioDrive::new(&cfg.pins).map_err(eyre::Report::new)?;
        follower_core::runner::run(
            &mut engine,
            array,
            &mut drive,
            MonotonicClock::new(),
            &params,
            shutdown,
        )
    }
    #[cfg(not(feature = "hardware"))]
    {
        let array = follower_hardware::SimulatedTrack::new();
        let mut drive = follower_hardware::SimulatedDrive;
        follower_core::runner::run(
            &mut engine,
            array,
            &mut drive,
            MonotonicClock::new(),
            &params,
            shutdown,
        )
    }
}

/// Replay a recorded scenario against the decision stack.
///
/// Playback always reads inline (one row per tick) and never touches
/// motors; the tick cap defaults to the scenario length so the run ends
/// cleanly instead of reading past the end.
pub fn run_scenario(
    cfg: &Config,
    rows: Vec<ScenarioRow>,
    tick_rate_override: Option<u32>,
    max_ticks: Option<u64>,
    shutdown: &AtomicBool,
) -> CoreResult<RunSummary> {
    let mut engine = build_engine(cfg)?;
    let cap = max_ticks.unwrap_or(rows.len() as u64);
    let params = RunParams {
        tick_rate_hz: tick_rate_override.unwrap_or(cfg.runner.tick_rate_hz),
        sensor_timeout: Duration::from_millis(cfg.timeouts.sensor_ms),
        max_ticks: Some(cap),
        mode: SamplingMode::Direct,
    };
    tracing::info!(rows = rows.len(), cap, "scenario replay start");

    let array = PlaybackArray::new(rows);
    let mut drive = follower_hardware::SimulatedDrive;
    follower_core::runner::run(
        &mut engine,
        array,
        &mut drive,
        MonotonicClock::new(),
        &params,
        shutdown,
    )
}

/// Probe the configured sensor and drive paths once.
pub fn self_check(cfg: &Config) -> CoreResult<()> {
    use follower_traits::{Drive, SensorArray};

    let timeout = Duration::from_millis(cfg.timeouts.sensor_ms);

    #[cfg(feature = "hardware")]
    {
        let mut array =
            follower_hardware::gpio::GpioSensorArray::new(&cfg.pins).map_err(eyre::Report::new)?;
        let mut drive =
            follower_hardware::gpio::GpioDrive::new(&cfg.pins).map_err(eyre::Report::new)?;
        let frame = array
            .read(timeout)
            .map_err(|e| eyre::Report::new(follower_core::EngineError::Hardware(e.to_string())))?;
        tracing::info!(?frame, "hardware frame ok");
        drive
            .stop()
            .map_err(|e| eyre::Report::new(follower_core::EngineError::Hardware(e.to_string())))?;
    }
    #[cfg(not(feature = "hardware"))]
    {
        let mut array = follower_hardware::SimulatedTrack::new();
        let mut drive = follower_hardware::SimulatedDrive;
        let frame = array
            .read(timeout)
            .map_err(|e| eyre::Report::new(follower_core::EngineError::Hardware(e.to_string())))?;
        tracing::info!(?frame, "simulated frame ok");
        drive
            .stop()
            .map_err(|e| eyre::Report::new(follower_core::EngineError::Hardware(e.to_string())))?;
    }
    Ok(())
}
