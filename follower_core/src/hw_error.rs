//! Boundary error mapping for the sensor and drive traits.
//!
//! `SensorArray` and `Drive` surface `Box<dyn Error + Send + Sync>` so
//! backends stay decoupled from the engine; the runner funnels those
//! through here to get typed `EngineError`s it can act on — a timeout
//! has its own exit path, a wiring fault is reported as such.

use crate::error::EngineError;

/// Map a trait-boundary error to a typed `EngineError`.
///
/// Known `follower_hardware` errors are matched variant by variant
/// behind the `hardware-errors` feature; anything else is classified
/// from its message text.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> EngineError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<follower_hardware::error::HwError>() {
        use follower_hardware::error::HwError;
        return match hw {
            HwError::Timeout => EngineError::SensorTimeout,
            HwError::Gpio(msg) => EngineError::HardwareFault(format!("gpio: {msg}")),
            other => EngineError::Hardware(other.to_string()),
        };
    }

    classify_message(&e.to_string())
}

/// Classify by message text for backends that do not expose `HwError`.
/// Both the IR array and the ultrasonic ranger fail by the clock first,
/// so anything that reads like a timed-out read or echo wait maps to
/// `SensorTimeout`; pin-level trouble is a fault, the rest is generic.
fn classify_message(s: &str) -> EngineError {
    let lower = s.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        EngineError::SensorTimeout
    } else if lower.contains("gpio") || lower.contains("echo") {
        EngineError::HardwareFault(s.to_string())
    } else {
        EngineError::Hardware(s.to_string())
    }
}
