#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core line-following decision logic (hardware-agnostic).
//!
//! This crate turns one sensor snapshot per control tick into exactly one
//! motion command. All hardware interactions go through the
//! `follower_traits::SensorArray` and `follower_traits::Drive` traits.
//!
//! ## Architecture
//!
//! - **Snapshot**: per-tick sensor capture and fault checks (`snapshot`)
//! - **Estimation**: weighted-centroid line position (`estimator`)
//! - **Classification**: intersection / wide-line / line-lost (`classifier`)
//! - **Safety**: bump, fault, and proximity arbitration (`safety`)
//! - **Recovery**: bounded search after losing the line (`recovery`)
//! - **Engine**: strict-priority arbitration over all of the above (`engine`)
//! - **Runner**: the paced read-decide-actuate loop (`runner`)
//!
//! The engine itself never blocks, sleeps, or panics; pacing and I/O live
//! in the runner and the optional background `sampler`.

pub mod classifier;
pub mod command;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod hw_error;
pub mod mocks;
pub mod recovery;
pub mod runner;
pub mod safety;
pub mod sampler;
pub mod snapshot;
pub mod util;

pub use classifier::Pattern;
pub use command::{Command, Decision, Rule, StopReason};
pub use config::{ObstaclePolicy, RecoveryTuning, Speeds, Thresholds};
pub use engine::{DecisionEngine, EngineBuilder};
pub use error::{BuildError, EngineError, Result};
pub use estimator::LineEstimate;
pub use recovery::{RecoveryState, SearchPhase};
pub use runner::{RunParams, RunSummary, SamplingMode, apply_command, run};
pub use snapshot::SensorSnapshot;
