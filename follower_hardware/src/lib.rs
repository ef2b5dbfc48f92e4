//! Sensor and drive implementations: simulation, scenario playback, and
//! the Raspberry Pi GPIO backends (behind the `hardware` feature).

pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod gpio;

use follower_config::ScenarioRow;
use follower_traits::{Drive, RawFrame, SensorArray, Side};

use crate::error::HwError;

/// Simulated track: the line wanders sinusoidally across the array and
/// the path ahead stays clear. Good enough to exercise the full decision
/// stack without a vehicle.
pub struct SimulatedTrack {
    tick: u64,
}

impl SimulatedTrack {
    pub fn new() -> Self {
        SimulatedTrack { tick: 0 }
    }
}

impl Default for SimulatedTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorArray for SimulatedTrack {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<RawFrame, Box<dyn std::error::Error + Send + Sync>> {
        // Line center in sensor-index space, 0..4, drifting slowly.
        let t = self.tick as f32 / 30.0;
        let center = 2.0 + 1.5 * t.sin();
        self.tick += 1;

        let mut ir = [0u16; 5];
        for (i, slot) in ir.iter_mut().enumerate() {
            let d = (i as f32 - center).abs();
            *slot = ((1.0 - d).max(0.0) * 900.0) as u16;
        }
        tracing::trace!(tick = self.tick, ?ir, "simulated frame");
        Ok(RawFrame {
            ir,
            bump: false,
            proximity_cm: 250.0,
        })
    }
}

/// Simulated drive: logs every command instead of moving motors.
pub struct SimulatedDrive;

impl Drive for SimulatedDrive {
    fn forward(&mut self, speed: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(speed, "drive forward (simulated)");
        Ok(())
    }
    fn reverse(&mut self, speed: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(speed, "drive reverse (simulated)");
        Ok(())
    }
    fn turn(
        &mut self,
        side: Side,
        speed: f32,
        intensity: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(?side, speed, intensity, "drive turn (simulated)");
        Ok(())
    }
    fn steer(
        &mut self,
        side: Side,
        magnitude: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(?side, magnitude, "drive steer (simulated)");
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("drive stop (simulated)");
        Ok(())
    }
}

/// Replays a recorded scenario, one row per read. Exhaustion is an error
/// so a playback run ends deterministically instead of looping on the
/// final frame.
pub struct PlaybackArray {
    rows: Vec<ScenarioRow>,
    idx: usize,
}

impl PlaybackArray {
    pub fn new(rows: Vec<ScenarioRow>) -> Self {
        PlaybackArray { rows, idx: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len().saturating_sub(self.idx)
    }
}

impl SensorArray for PlaybackArray {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<RawFrame, Box<dyn std::error::Error + Send + Sync>> {
        let Some(row) = self.rows.get(self.idx) else {
            return Err(Box::new(HwError::PlaybackExhausted));
        };
        self.idx += 1;
        Ok(RawFrame {
            ir: row.ir(),
            bump: row.bump != 0,
            proximity_cm: row.proximity_cm,
        })
    }
}
