//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "follower", version, about = "Line follower CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/follower.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the line until a terminal stop, the tick cap, or Ctrl-C
    Follow {
        /// Replay a recorded scenario CSV instead of reading sensors
        #[arg(long, value_name = "FILE")]
        scenario: Option<PathBuf>,
        /// Override the configured control loop rate
        #[arg(long, value_name = "HZ")]
        tick_rate_hz: Option<u32>,
        /// Stop after this many ticks (defaults to the scenario length
        /// when replaying, unbounded otherwise)
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Read sensors inside the control loop instead of the sampler thread
        #[arg(long, action = ArgAction::SetTrue)]
        direct: bool,
    },
    /// Validate the config file and print the effective values
    CheckConfig,
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
