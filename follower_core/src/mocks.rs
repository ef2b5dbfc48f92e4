//! Test and playback helpers for follower_core.

use follower_traits::{Drive, RawFrame, SensorArray, Side};

/// Replays a prepared sequence of frames; after the last one it either
/// holds it (simulating a frozen scene) or errors out.
pub struct ScriptedArray {
    frames: Vec<RawFrame>,
    idx: usize,
    hold_last: bool,
}

impl ScriptedArray {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self {
            frames,
            idx: 0,
            hold_last: true,
        }
    }

    /// Error on exhaustion instead of holding the final frame.
    pub fn finite(frames: Vec<RawFrame>) -> Self {
        Self {
            frames,
            idx: 0,
            hold_last: false,
        }
    }
}

impl SensorArray for ScriptedArray {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<RawFrame, Box<dyn std::error::Error + Send + Sync>> {
        if self.idx < self.frames.len() {
            let f = self.frames[self.idx];
            self.idx += 1;
            return Ok(f);
        }
        if self.hold_last && !self.frames.is_empty() {
            return Ok(self.frames[self.frames.len() - 1]);
        }
        Err(Box::new(std::io::Error::other("scripted frames exhausted")))
    }
}

/// Records every drive call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveCall {
    Forward(f32),
    Reverse(f32),
    Turn(Side, f32, f32),
    Steer(Side, f32),
    Stop,
}

#[derive(Default)]
pub struct RecordingDrive {
    pub calls: Vec<DriveCall>,
}

impl Drive for RecordingDrive {
    fn forward(&mut self, speed: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.push(DriveCall::Forward(speed));
        Ok(())
    }
    fn reverse(&mut self, speed: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.push(DriveCall::Reverse(speed));
        Ok(())
    }
    fn turn(
        &mut self,
        side: Side,
        speed: f32,
        intensity: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.push(DriveCall::Turn(side, speed, intensity));
        Ok(())
    }
    fn steer(
        &mut self,
        side: Side,
        magnitude: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.push(DriveCall::Steer(side, magnitude));
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.push(DriveCall::Stop);
        Ok(())
    }
}
