pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One raw reading of the full sensor suite, as delivered by a driver.
///
/// Values are uninterpreted: range checks and fault policy live in the
/// decision core, not in drivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrame {
    /// Five IR reflectance channels, far-left..far-right (index 2 = center).
    pub ir: [u16; 5],
    /// Contact (bump) switch state; true = collision.
    pub bump: bool,
    /// Ranging sensor distance in centimeters.
    pub proximity_cm: f32,
}

/// Source of sensor frames (GPIO/ADC reader, simulation, or recorded playback).
pub trait SensorArray {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<RawFrame, Box<dyn std::error::Error + Send + Sync>>;
}

/// Sweep direction for recovery maneuvers and turn commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Actuator seam. Speeds and intensities are abstract magnitudes in
/// [0.0, 1.0]; the driver owns the mapping to PWM/duty cycle.
pub trait Drive {
    fn forward(&mut self, speed: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn reverse(&mut self, speed: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Pivot toward `side` at `speed`, sharper with higher `intensity`.
    fn turn(
        &mut self,
        side: Side,
        speed: f32,
        intensity: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Gentle differential correction toward `side` while moving forward.
    fn steer(
        &mut self,
        side: Side,
        magnitude: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
