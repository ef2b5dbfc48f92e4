//! Raspberry Pi GPIO backends: digital IR array, HC-SR04 ranging, bump
//! switch, and an L298N dual H-bridge drive.

use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::wait_for_level_with_timeout;
use follower_config::Pins;
use follower_traits::{Drive, RawFrame, SensorArray, Side};

/// Software PWM frequency for the motor bridge.
const PWM_HZ: f64 = 100.0;
/// Echo poll granularity; the echo pulse for 400cm is ~23ms long.
const ECHO_POLL: Duration = Duration::from_micros(50);
/// Speed of sound round trip: centimeters per microsecond of echo.
const CM_PER_US: f32 = 1.0 / 58.0;

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Sensor suite read directly from GPIO lines.
///
/// The IR channels are digital comparator outputs, reported as 0 or
/// full-scale so the decision core sees the same value range as an ADC
/// build would produce.
pub struct GpioSensorArray {
    ir: [InputPin; 5],
    bump: InputPin,
    trig: OutputPin,
    echo: InputPin,
}

impl GpioSensorArray {
    pub fn new(pins: &Pins) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mk_input = |n: u8| -> Result<InputPin> {
            Ok(gpio.get(n).map_err(gpio_err)?.into_input_pullup())
        };
        let ir = [
            mk_input(pins.ir[0])?,
            mk_input(pins.ir[1])?,
            mk_input(pins.ir[2])?,
            mk_input(pins.ir[3])?,
            mk_input(pins.ir[4])?,
        ];
        let bump = mk_input(pins.bump)?;
        let mut trig = gpio
            .get(pins.ultrasonic_trig)
            .map_err(gpio_err)?
            .into_output();
        trig.set_low();
        let echo = gpio.get(pins.ultrasonic_echo).map_err(gpio_err)?.into_input();
        Ok(Self {
            ir,
            bump,
            trig,
            echo,
        })
    }

    /// One HC-SR04 ping: 10us trigger pulse, then time the echo pulse.
    fn range_cm(&mut self, timeout: Duration) -> Result<f32> {
        self.trig.set_high();
        std::thread::sleep(Duration::from_micros(10));
        self.trig.set_low();

        let echo = &self.echo;
        let rise = wait_for_level_with_timeout(|| echo.is_high(), timeout, ECHO_POLL)?;
        let fall = wait_for_level_with_timeout(|| echo.is_low(), timeout, ECHO_POLL)?;
        let pulse_us = fall.saturating_duration_since(rise).as_micros() as f32;
        Ok(pulse_us * CM_PER_US)
    }
}

impl SensorArray for GpioSensorArray {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<RawFrame, Box<dyn std::error::Error + Send + Sync>> {
        let deadline = Instant::now() + timeout;
        let mut ir = [0u16; 5];
        for (pin, slot) in self.ir.iter().zip(ir.iter_mut()) {
            // Comparator boards pull the line low over the line.
            *slot = if pin.is_low() { 1023 } else { 0 };
        }
        let bump = self.bump.is_low();
        let budget = deadline.saturating_duration_since(Instant::now());
        if budget.is_zero() {
            return Err(Box::new(HwError::Timeout));
        }
        let proximity_cm = self.range_cm(budget).map_err(Box::new)?;
        trace!(?ir, bump, proximity_cm, "gpio frame");
        Ok(RawFrame {
            ir,
            bump,
            proximity_cm,
        })
    }
}

/// L298N dual H-bridge: one PWM pair per side.
pub struct GpioDrive {
    left_fwd: OutputPin,
    left_rev: OutputPin,
    right_fwd: OutputPin,
    right_rev: OutputPin,
    /// Last commanded forward duty, used as the base for steer corrections.
    base_speed: f32,
}

impl GpioDrive {
    pub fn new(pins: &Pins) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mk_output = |n: u8| -> Result<OutputPin> {
            let mut p = gpio.get(n).map_err(gpio_err)?.into_output();
            p.set_low();
            Ok(p)
        };
        Ok(Self {
            left_fwd: mk_output(pins.motor_left_fwd)?,
            left_rev: mk_output(pins.motor_left_rev)?,
            right_fwd: mk_output(pins.motor_right_fwd)?,
            right_rev: mk_output(pins.motor_right_rev)?,
            base_speed: 0.0,
        })
    }

    /// Signed per-side duty: positive drives forward, negative reverse.
    fn set_sides(&mut self, left: f32, right: f32) -> Result<()> {
        set_signed(&mut self.left_fwd, &mut self.left_rev, left)?;
        set_signed(&mut self.right_fwd, &mut self.right_rev, right)?;
        trace!(left, right, "bridge duty");
        Ok(())
    }
}

fn set_signed(fwd: &mut OutputPin, rev: &mut OutputPin, duty: f32) -> Result<()> {
    let duty = duty.clamp(-1.0, 1.0);
    if duty >= 0.0 {
        rev.clear_pwm().map_err(gpio_err)?;
        rev.set_low();
        fwd.set_pwm_frequency(PWM_HZ, f64::from(duty))
            .map_err(gpio_err)?;
    } else {
        fwd.clear_pwm().map_err(gpio_err)?;
        fwd.set_low();
        rev.set_pwm_frequency(PWM_HZ, f64::from(-duty))
            .map_err(gpio_err)?;
    }
    Ok(())
}

impl Drive for GpioDrive {
    fn forward(
        &mut self,
        speed: f32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.base_speed = speed.clamp(0.0, 1.0);
        self.set_sides(self.base_speed, self.base_speed)
            .map_err(|e| Box::new(e) as _)
    }

    fn reverse(
        &mut self,
        speed: f32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let s = speed.clamp(0.0, 1.0);
        self.set_sides(-s, -s).map_err(|e| Box::new(e) as _)
    }

    fn turn(
        &mut self,
        side: Side,
        speed: f32,
        intensity: f32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let s = speed.clamp(0.0, 1.0);
        // Full intensity pivots in place; lower intensity arcs.
        let inner = s * (1.0 - 2.0 * intensity.clamp(0.0, 1.0));
        let (l, r) = match side {
            Side::Left => (inner, s),
            Side::Right => (s, inner),
        };
        self.set_sides(l, r).map_err(|e| Box::new(e) as _)
    }

    fn steer(
        &mut self,
        side: Side,
        magnitude: f32,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Differential correction around the last forward duty.
        let base = if self.base_speed > 0.0 {
            self.base_speed
        } else {
            0.3
        };
        let inner = base * (1.0 - magnitude.clamp(0.0, 1.0));
        let (l, r) = match side {
            Side::Left => (inner, base),
            Side::Right => (base, inner),
        };
        self.set_sides(l, r).map_err(|e| Box::new(e) as _)
    }

    fn stop(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.base_speed = 0.0;
        self.set_sides(0.0, 0.0).map_err(|e| Box::new(e) as _)
    }
}
