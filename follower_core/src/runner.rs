//! The control loop: read, decide, actuate, once per tick.
//!
//! The runner owns the pacing clock and the shutdown flag check; the
//! engine stays a pure per-tick function of its inputs. Terminal stop
//! decisions end the run; transient stops (emergency proximity, halt
//! policy) keep the loop alive so the vehicle resumes when the scene
//! clears.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use tracing::{debug, info, warn};

use follower_traits::clock::Clock;
use follower_traits::{Drive, RawFrame, SensorArray, Side};

use crate::command::{Command, Decision};
use crate::config::Speeds;
use crate::engine::DecisionEngine;
use crate::error::{EngineError, Result};
use crate::hw_error::map_hw_error;
use crate::sampler::Sampler;
use crate::snapshot::SensorSnapshot;

/// Sensor acquisition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Read the sensor array inline, once per tick.
    Direct,
    /// A background thread paces reads at the given rate; each tick
    /// consumes the latest published frame.
    Sampled { hz: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    /// Control loop rate in Hz.
    pub tick_rate_hz: u32,
    /// Max wait per sensor read; also the sampled-mode stall budget.
    pub sensor_timeout: Duration,
    /// Cap on ticks, mainly for scenario playback. None = run until a
    /// terminal stop or shutdown.
    pub max_ticks: Option<u64>,
    pub mode: SamplingMode,
}

/// How a run ended, for the caller's exit reporting.
#[derive(Debug)]
pub struct RunSummary {
    /// Ticks actually executed.
    pub ticks: u64,
    /// The final decision, if at least one tick ran.
    pub last: Option<Decision>,
}

enum Source<A> {
    Direct(A),
    Sampled {
        sampler: Sampler,
        held: Option<RawFrame>,
        epoch: std::time::Instant,
    },
}

/// Drive the vehicle until a terminal stop, the tick cap, or shutdown.
///
/// The drive is always commanded to stop before returning, including on
/// the error paths.
pub fn run<A, D, C>(
    engine: &mut DecisionEngine,
    array: A,
    drive: &mut D,
    clock: C,
    params: &RunParams,
    shutdown: &AtomicBool,
) -> Result<RunSummary>
where
    A: SensorArray + Send + 'static,
    D: Drive + ?Sized,
    C: Clock + Clone + Send + Sync + 'static,
{
    let period = Duration::from_micros(crate::util::period_us(params.tick_rate_hz));
    let mut source = match params.mode {
        SamplingMode::Direct => Source::Direct(array),
        SamplingMode::Sampled { hz } => {
            let sampler = Sampler::spawn(array, hz, params.sensor_timeout, clock.clone());
            Source::Sampled {
                sampler,
                held: None,
                epoch: clock.now(),
            }
        }
    };
    let mut recovery = engine.new_recovery_state();

    let mut ticks: u64 = 0;
    let mut last: Option<Decision> = None;

    let outcome = loop {
        if shutdown.load(Ordering::SeqCst) {
            info!(ticks, "shutdown requested, stopping");
            break Ok(());
        }
        if let Some(cap) = params.max_ticks {
            if ticks >= cap {
                debug!(ticks, "tick cap reached");
                break Ok(());
            }
        }

        let frame = match next_frame(&mut source, &clock, params.sensor_timeout) {
            Ok(frame) => frame,
            Err(e) => break Err(e),
        };

        let snapshot = SensorSnapshot::from_frame(frame, ticks);
        let decision = engine.decide(&snapshot, &mut recovery);
        debug!(
            tick = ticks,
            rule = %decision.rule,
            command = ?decision.command,
            "tick"
        );

        if let Err(e) = apply_command(drive, engine.speeds(), &decision.command) {
            break Err(e.wrap_err("applying drive command"));
        }

        ticks += 1;
        let terminal = decision.is_terminal();
        last = Some(decision);
        if terminal {
            info!(ticks, "terminal stop, ending run");
            break Ok(());
        }

        clock.sleep(period);
    };

    // Best-effort final stop; a failure here must not mask the run error.
    if let Err(e) = drive.stop() {
        warn!(error = %e, "drive stop on run exit failed");
    }

    outcome.map(|()| RunSummary { ticks, last })
}

fn next_frame<A, C>(source: &mut Source<A>, clock: &C, timeout: Duration) -> Result<RawFrame>
where
    A: SensorArray,
    C: Clock,
{
    match source {
        Source::Direct(array) => array
            .read(timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("sensor read failed"),
        Source::Sampled {
            sampler,
            held,
            epoch,
        } => {
            if let Some(frame) = sampler.latest() {
                *held = Some(frame);
                return Ok(frame);
            }
            // No fresh frame this tick. A stall past the timeout budget
            // is a sensor failure regardless of what we hold.
            let stalled = sampler.stalled_for(clock.ms_since(*epoch));
            if stalled > timeout.as_millis() as u64 {
                return Err(eyre::Report::new(EngineError::SensorTimeout))
                    .wrap_err_with(|| format!("sampler stalled for {stalled}ms"));
            }
            match *held {
                // Healthy sampler, just no update yet: reuse the frame.
                Some(frame) => Ok(frame),
                // First tick of the run: block for the initial frame.
                None => match sampler.recv_timeout(timeout) {
                    Some(frame) => {
                        *held = Some(frame);
                        Ok(frame)
                    }
                    None => Err(eyre::Report::new(EngineError::SensorTimeout))
                        .wrap_err("no sensor frame received"),
                },
            }
        }
    }
}

/// Translate one decision into actuator calls.
///
/// Search sweeps pivot at the configured search speed with full
/// intensity so the array swings across the expected line position.
pub fn apply_command<D: Drive + ?Sized>(
    drive: &mut D,
    speeds: &Speeds,
    command: &Command,
) -> Result<()> {
    let res = match command {
        Command::Forward { speed } => drive.forward(*speed),
        Command::Reverse { speed } => drive.reverse(*speed),
        Command::TurnLeft { speed, intensity } => drive.turn(Side::Left, *speed, *intensity),
        Command::TurnRight { speed, intensity } => drive.turn(Side::Right, *speed, *intensity),
        Command::CorrectLeft { magnitude } => drive.steer(Side::Left, *magnitude),
        Command::CorrectRight { magnitude } => drive.steer(Side::Right, *magnitude),
        Command::SearchSweep { direction } => drive.turn(*direction, speeds.search, 1.0),
        Command::Stop { .. } => drive.stop(),
    };
    res.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::StopReason;
    use crate::config::{ObstaclePolicy, Thresholds};
    use crate::mocks::{DriveCall, RecordingDrive, ScriptedArray};
    use follower_traits::clock::test_clock::TestClock;

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

    fn engine() -> DecisionEngine {
        DecisionEngine::builder()
            .with_thresholds(thresholds())
            .build()
            .unwrap()
    }

    fn frame(ir: [u16; 5], bump: bool, proximity_cm: f32) -> RawFrame {
        RawFrame {
            ir,
            bump,
            proximity_cm,
        }
    }

    fn params(max_ticks: Option<u64>) -> RunParams {
        RunParams {
            tick_rate_hz: 20,
            sensor_timeout: Duration::from_millis(100),
            max_ticks,
            mode: SamplingMode::Direct,
        }
    }

    #[test]
    fn straight_line_runs_to_tick_cap() {
        let mut engine = engine();
        let array = ScriptedArray::new(vec![frame([100, 100, 900, 100, 100], false, 300.0)]);
        let mut drive = RecordingDrive::default();
        let shutdown = AtomicBool::new(false);

        let summary = run(
            &mut engine,
            array,
            &mut drive,
            TestClock::new(),
            &params(Some(5)),
            &shutdown,
        )
        .unwrap();

        assert_eq!(summary.ticks, 5);
        assert!(matches!(
            summary.last.as_ref().unwrap().command,
            Command::Forward { .. }
        ));
        // 5 forward calls plus the final stop on exit
        assert_eq!(drive.calls.len(), 6);
        assert_eq!(*drive.calls.last().unwrap(), DriveCall::Stop);
    }

    #[test]
    fn collision_ends_run_before_tick_cap() {
        let mut engine = engine();
        let array = ScriptedArray::new(vec![
            frame([100, 100, 900, 100, 100], false, 300.0),
            frame([100, 100, 900, 100, 100], true, 300.0),
        ]);
        let mut drive = RecordingDrive::default();
        let shutdown = AtomicBool::new(false);

        let summary = run(
            &mut engine,
            array,
            &mut drive,
            TestClock::new(),
            &params(Some(100)),
            &shutdown,
        )
        .unwrap();

        assert_eq!(summary.ticks, 2);
        let last = summary.last.unwrap();
        assert!(matches!(
            last.command,
            Command::Stop {
                reason: StopReason::Collision
            }
        ));
        assert!(drive.calls.contains(&DriveCall::Stop));
    }

    #[test]
    fn shutdown_flag_stops_before_first_tick() {
        let mut engine = engine();
        let array = ScriptedArray::new(vec![frame([100, 100, 900, 100, 100], false, 300.0)]);
        let mut drive = RecordingDrive::default();
        let shutdown = AtomicBool::new(true);

        let summary = run(
            &mut engine,
            array,
            &mut drive,
            TestClock::new(),
            &params(None),
            &shutdown,
        )
        .unwrap();

        assert_eq!(summary.ticks, 0);
        assert!(summary.last.is_none());
        assert_eq!(drive.calls, vec![DriveCall::Stop]);
    }

    #[test]
    fn scripted_exhaustion_surfaces_as_error_and_stops_drive() {
        let mut engine = engine();
        let array = ScriptedArray::finite(vec![frame([100, 100, 900, 100, 100], false, 300.0)]);
        let mut drive = RecordingDrive::default();
        let shutdown = AtomicBool::new(false);

        let err = run(
            &mut engine,
            array,
            &mut drive,
            TestClock::new(),
            &params(Some(10)),
            &shutdown,
        )
        .unwrap_err();

        assert!(err.to_string().contains("sensor read failed"));
        assert_eq!(*drive.calls.last().unwrap(), DriveCall::Stop);
    }

    #[test]
    fn transient_obstacle_stop_does_not_end_run() {
        let mut t = thresholds();
        t.obstacle_policy = ObstaclePolicy::Halt;
        let mut engine = DecisionEngine::builder()
            .with_thresholds(t)
            .build()
            .unwrap();
        // Obstacle appears, then clears; the run continues to the cap.
        let array = ScriptedArray::new(vec![
            frame([100, 100, 900, 100, 100], false, 40.0),
            frame([100, 100, 900, 100, 100], false, 300.0),
        ]);
        let mut drive = RecordingDrive::default();
        let shutdown = AtomicBool::new(false);

        let summary = run(
            &mut engine,
            array,
            &mut drive,
            TestClock::new(),
            &params(Some(3)),
            &shutdown,
        )
        .unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(drive.calls[0], DriveCall::Stop);
        assert!(matches!(drive.calls[1], DriveCall::Forward(_)));
    }

    #[test]
    fn correction_commands_map_to_steer() {
        let mut drive = RecordingDrive::default();
        let speeds = Speeds::default();
        apply_command(&mut drive, &speeds, &Command::CorrectLeft { magnitude: 0.4 }).unwrap();
        apply_command(&mut drive, &speeds, &Command::CorrectRight { magnitude: 0.3 }).unwrap();
        apply_command(
            &mut drive,
            &speeds,
            &Command::SearchSweep {
                direction: Side::Left,
            },
        )
        .unwrap();
        assert_eq!(
            drive.calls,
            vec![
                DriveCall::Steer(Side::Left, 0.4),
                DriveCall::Steer(Side::Right, 0.3),
                DriveCall::Turn(Side::Left, speeds.search, 1.0),
            ]
        );
    }
}
