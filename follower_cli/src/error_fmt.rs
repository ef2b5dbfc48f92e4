//! Human-readable error descriptions, structured JSON output, and stable
//! exit codes.

use follower_core::command::StopReason;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use follower_core::error::{BuildError, EngineError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingThresholds => {
                "What happened: No thresholds were provided to the decision engine.\nLikely causes: The [thresholds] section is missing from the config.\nHow to fix: Add a [thresholds] table to the TOML; there are no built-in safety defaults.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ee) = err.downcast_ref::<EngineError>() {
        if matches!(ee, EngineError::SensorTimeout) {
            return "What happened: Sensor read timed out.\nLikely causes: Sensor wiring or power issue, or timeouts.sensor_ms too low.\nHow to fix: Verify the [pins] wiring and power, and consider raising timeouts.sensor_ms in the config.".to_string();
        }
        return format!(
            "What happened: {ee}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config.
    // Alternate formatting includes the whole context chain.
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("gpio") {
        return "What happened: Failed to initialize or drive GPIO lines.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("scenario csv must have headers") {
        return "Invalid headers in scenario CSV. Expected 'ir1,ir2,ir3,ir4,ir5,bump,proximity_cm'.".to_string();
    }

    if lower.contains("playback exhausted") {
        return "What happened: The scenario ended before the tick cap.\nLikely causes: --max-ticks larger than the number of CSV rows.\nHow to fix: Drop --max-ticks or extend the scenario.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for terminal stops, so scripts can tell outcomes
/// apart. Clean exits (tick cap, shutdown) are 0.
pub fn exit_code_for_stop(reason: StopReason) -> i32 {
    match reason {
        StopReason::LineLostExhausted => 3,
        StopReason::Collision => 4,
        StopReason::SensorFault => 5,
        // Non-terminal reasons never end a run; reaching here is a clean exit.
        StopReason::EmergencyProximity | StopReason::Obstacle => 0,
    }
}

/// Exit codes for hard errors; non-specific errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use follower_core::error::EngineError;
    if let Some(EngineError::SensorTimeout) = err.downcast_ref::<EngineError>() {
        return 6;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
